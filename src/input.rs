use crate::model::{TargetSpec, DEFAULT_PORT};
use anyhow::{bail, Context};

/// Parses `host`, `host:port`, `[v6]`, `[v6]:port` or a bare IPv6 literal.
pub fn parse_target(token: &str) -> anyhow::Result<TargetSpec> {
    let token = token.trim();
    if token.is_empty() {
        bail!("empty target");
    }

    if let Some(rest) = token.strip_prefix('[') {
        let (host, tail) = rest
            .split_once(']')
            .with_context(|| format!("unterminated IPv6 literal in {token}"))?;
        let port = match tail {
            "" => DEFAULT_PORT,
            _ => parse_port(
                tail.strip_prefix(':')
                    .with_context(|| format!("unexpected text after ']' in {token}"))?,
            )?,
        };
        return spec(host, port);
    }

    match token.rsplit_once(':') {
        // More than one colon without brackets can only be a bare IPv6 address.
        Some((host, _)) if host.contains(':') => spec(token, DEFAULT_PORT),
        Some((host, port)) => spec(host, parse_port(port)?),
        None => spec(token, DEFAULT_PORT),
    }
}

fn parse_port(port: &str) -> anyhow::Result<u16> {
    match port.parse::<u16>() {
        Ok(0) | Err(_) => bail!("invalid port {port:?}"),
        Ok(port) => Ok(port),
    }
}

fn spec(host: &str, port: u16) -> anyhow::Result<TargetSpec> {
    if host.is_empty() {
        bail!("missing host name");
    }
    if host.starts_with('-') {
        bail!("{host} looks like an option, not a host name");
    }
    Ok(TargetSpec {
        host: host.to_string(),
        port,
    })
}
