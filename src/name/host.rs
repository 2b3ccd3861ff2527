use crate::core::Result;
use crate::name::{Authority, FileName, NameParser, RawUri};
use crate::Error;

/// Parser for host-addressed schemes such as `hdfs://namenode:8020/path`.
///
/// The authority is a DFS host with an optional port. Host names are case-insensitive and
/// stored lowercase; IPv6 literals keep their brackets (`[::1]:8020`).
#[derive(Debug, Clone)]
pub struct HostNameParser {
    scheme: &'static str,
}

impl HostNameParser {
    pub fn new(scheme: &'static str) -> Self {
        Self { scheme }
    }
}

impl NameParser for HostNameParser {
    fn scheme(&self) -> &'static str {
        self.scheme
    }

    fn parse_uri(&self, uri: &RawUri<'_>) -> Result<FileName> {
        let credentials = uri.credentials()?;
        let authority = parse_host_port(uri.raw(), uri.authority())?;
        let path = uri.normalized_path()?;
        Ok(FileName::new(self.scheme, credentials, authority, path))
    }
}

fn parse_host_port(raw: &str, value: &str) -> Result<Authority> {
    let (host, port) = if let Some(stripped) = value.strip_prefix('[') {
        let Some(end) = stripped.find(']') else {
            return Err(Error::malformed(raw, "unterminated IPv6 literal"));
        };
        let literal = &stripped[..end];
        if literal.is_empty() || !literal.chars().all(|c| c.is_ascii_hexdigit() || c == ':') {
            return Err(Error::malformed(raw, "invalid IPv6 literal"));
        }
        let rest = &stripped[end + 1..];
        let port = match rest {
            "" => None,
            _ => match rest.strip_prefix(':') {
                Some(port) => Some(port),
                None => return Err(Error::malformed(raw, "unexpected text after IPv6 literal")),
            },
        };
        (format!("[{}]", literal.to_ascii_lowercase()), port)
    } else {
        let (host, port) = match value.split_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (value, None),
        };
        if host.is_empty() {
            return Err(Error::malformed(raw, "missing host"));
        }
        if !host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_'))
        {
            return Err(Error::malformed(raw, format!("invalid host `{host}`")));
        }
        (host.to_ascii_lowercase(), port)
    };

    let port = match port {
        Some(port) => match port.parse::<u16>() {
            Ok(port) => Some(port),
            Err(_) => return Err(Error::malformed(raw, format!("invalid port `{port}`"))),
        },
        None => None,
    };
    Ok(Authority::new(host, port))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::name::Credentials;

    fn parser() -> HostNameParser {
        HostNameParser::new("hdfs")
    }

    #[test]
    fn test_parse_namenode_uri() -> Result<()> {
        let name = parser().parse("hdfs://namenode:8020/data/file.csv", None)?;
        assert_eq!(name.scheme(), "hdfs");
        assert_eq!(name.authority().to_string(), "namenode:8020");
        assert_eq!(name.authority().host(), "namenode");
        assert_eq!(name.authority().port(), Some(8020));
        assert_eq!(name.path(), "/data/file.csv");
        assert_eq!(name.credentials(), None);
        Ok(())
    }

    #[test]
    fn test_parse_canonicalizes() -> Result<()> {
        let name = parser().parse("HDFS://NameNode/data//in/../file.csv/", None)?;
        assert_eq!(name.uri(), "hdfs://namenode/data/file.csv");
        let root = parser().parse("hdfs://namenode", None)?;
        assert_eq!(root.path(), "/");
        Ok(())
    }

    #[test]
    fn test_parse_user_and_ipv6() -> Result<()> {
        let name = parser().parse("hdfs://etl@[::1]:9000/tmp", None)?;
        assert_eq!(name.credentials(), Some(&Credentials::new("etl", None)));
        assert_eq!(name.authority().host(), "[::1]");
        assert_eq!(name.authority().port(), Some(9000));
        assert_eq!(name.uri(), "hdfs://etl@[::1]:9000/tmp");
        Ok(())
    }

    #[test]
    fn test_round_trip() -> Result<()> {
        let inputs = [
            "hdfs://namenode:8020/data/file.csv",
            "hdfs://etl:pw@nn.example.com/a/./b/../c",
            "hdfs://[fe80::1]:8020/",
            "hdfs://nn",
        ];
        for raw in inputs {
            let first = parser().parse(raw, None)?;
            let second = parser().parse(&first.to_string(), None)?;
            assert_eq!(first, second, "round trip of {raw}");
        }
        Ok(())
    }

    #[test]
    fn test_parse_relative_to_base() -> Result<()> {
        let base = parser().parse("hdfs://namenode:8020/data", None)?;
        let name = parser().parse("in/file.csv", Some(&base))?;
        assert_eq!(name.uri(), "hdfs://namenode:8020/data/in/file.csv");
        let name = parser().parse("/tmp/x", Some(&base))?;
        assert_eq!(name.uri(), "hdfs://namenode:8020/tmp/x");
        Ok(())
    }

    #[test]
    fn test_parse_errors() {
        let cases = [
            "/data/file.csv",
            "hdfs:///data",
            "hdfs://namenode:http/data",
            "hdfs://namenode:70000/data",
            "hdfs://name node/data",
            "hdfs://[::1/data",
            "hdfs://namenode/../data",
            "s3://bucket/data",
        ];
        for raw in cases {
            let err = parser().parse(raw, None).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::MalformedName, "{raw}");
        }
    }
}
