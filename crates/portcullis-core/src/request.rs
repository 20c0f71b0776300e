use portcullis_http::{Headers, Method};

/// A transport-agnostic view of an incoming request.
///
/// The host HTTP server is responsible for reading the request off
/// the wire (spec.md §1 names this an external collaborator); this
/// struct is what it hands to the dispatch core once the request
/// line and headers have been parsed.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    query: String,
    headers: Headers,
    /// host:port of the directly-connected peer, as seen by the
    /// process (i.e. before any `X-Forwarded-For` trust decisions).
    remote_addr: String,
    /// whether the connection delivering this request is terminated
    /// with TLS, as reported by the transport layer.
    tls: bool,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>, headers: Headers) -> Self {
        let path = path.into();
        let (path, query) = match path.split_once('?') {
            Some((p, q)) => (p.to_string(), q.to_string()),
            None => (path, String::new()),
        };
        Self {
            method,
            path,
            query,
            headers,
            remote_addr: String::new(),
            tls: false,
        }
    }

    pub fn with_remote_addr(mut self, remote_addr: impl Into<String>) -> Self {
        self.remote_addr = remote_addr.into();
        self
    }

    pub fn with_tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn set_method(&mut self, method: Method) {
        self.method = method;
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// The `Host` header, lowercased, with the default port for the
    /// active scheme stripped — matching the key the Domain Registry
    /// indexes by (spec.md §4.2).
    pub fn host(&self) -> String {
        let raw = self.header("host").unwrap_or_default().to_ascii_lowercase();
        let (host, port) = match raw.rsplit_once(':') {
            Some((h, p)) => (h, p),
            None => (raw.as_str(), ""),
        };
        let default_port = if self.scheme() == "https" { "443" } else { "80" };
        if port.is_empty() || port == default_port {
            host.to_string()
        } else {
            format!("{host}:{port}")
        }
    }

    /// Client IP resolution per spec.md §4.9: first non-empty of the
    /// first token of `X-Forwarded-For`, `X-Real-IP`, the remote
    /// address.
    pub fn client_ip(&self) -> &str {
        if let Some(xff) = self.header("x-forwarded-for") {
            if let Some(first) = xff.split(',').map(str::trim).find(|s| !s.is_empty()) {
                return first;
            }
        }
        if let Some(real_ip) = self.header("x-real-ip") {
            if !real_ip.is_empty() {
                return real_ip;
            }
        }
        host_only(&self.remote_addr)
    }

    /// Scheme detection per spec.md §4.9.
    pub fn scheme(&self) -> &str {
        if self.header("x-forwarded-ssl") == Some("on") {
            return "https";
        }
        if self.tls {
            return "https";
        }
        if self.header("x-forwarded-protocol") == Some("https") {
            return "https";
        }
        if self.header("x-forwarded-proto") == Some("https") {
            return "https";
        }
        if let Some(explicit) = self.header("x-url-scheme") {
            if !explicit.is_empty() {
                return explicit;
            }
        }
        "http"
    }

    pub fn is_secure(&self) -> bool {
        self.scheme() == "https"
    }

    pub fn referer(&self) -> Option<&str> {
        self.header("referer")
    }
}

fn host_only(addr: &str) -> &str {
    if let Some(rest) = addr.strip_prefix('[') {
        // bracketed IPv6 literal, e.g. "[::1]:8080"
        if let Some(end) = rest.find(']') {
            return &rest[..end];
        }
    }
    match addr.rsplit_once(':') {
        Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => host,
        _ => addr,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(headers: &[(&str, &str)]) -> Request {
        let mut h = Headers::new();
        for (k, v) in headers {
            h.insert(*k, *v);
        }
        Request::new(Method::Get, "/", h)
    }

    #[test]
    fn client_ip_prefers_forwarded_for() {
        let r = req(&[("x-forwarded-for", "1.2.3.4, 5.6.7.8"), ("x-real-ip", "9.9.9.9")])
            .with_remote_addr("10.0.0.1:1234");
        assert_eq!(r.client_ip(), "1.2.3.4");
    }

    #[test]
    fn client_ip_falls_back_to_real_ip() {
        let r = req(&[("x-real-ip", "9.9.9.9")]).with_remote_addr("10.0.0.1:1234");
        assert_eq!(r.client_ip(), "9.9.9.9");
    }

    #[test]
    fn client_ip_falls_back_to_remote_addr() {
        let r = req(&[]).with_remote_addr("10.0.0.1:1234");
        assert_eq!(r.client_ip(), "10.0.0.1");
    }

    #[test]
    fn scheme_detection_order() {
        assert_eq!(req(&[("x-forwarded-ssl", "on")]).scheme(), "https");
        assert_eq!(req(&[("x-forwarded-protocol", "https")]).scheme(), "https");
        assert_eq!(req(&[("x-forwarded-proto", "https")]).scheme(), "https");
        assert_eq!(req(&[("x-url-scheme", "https")]).scheme(), "https");
        assert_eq!(req(&[]).scheme(), "http");
        assert!(req(&[]).with_tls(true).is_secure());
    }

    #[test]
    fn host_strips_default_port() {
        let r = req(&[("host", "Example.com:80")]);
        assert_eq!(r.host(), "example.com");
        let r = req(&[("host", "example.com:8080")]);
        assert_eq!(r.host(), "example.com:8080");
    }

    #[test]
    fn path_and_query_split() {
        let r = Request::new(Method::Get, "/a/b?x=1&y=2", Headers::new());
        assert_eq!(r.path(), "/a/b");
        assert_eq!(r.query(), "x=1&y=2");
    }
}
