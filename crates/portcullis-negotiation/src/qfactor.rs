/// One entry of a q-factor-weighted header list (`Accept`,
/// `Accept-Language`, `Accept-Encoding`), e.g. the
/// `application/json;q=0.9;level=1` piece of an `Accept` header.
#[derive(Debug, Clone, PartialEq)]
pub struct QualifiedValue {
    pub value: String,
    /// Parameters after the first `;`, excluding `q` itself, in order.
    ///
    /// A parameter token with no `=` (e.g. the trailing `;foo` in
    /// `text/html;foo;q=0.8`) is preserved as `("foo", "")` rather than
    /// dropped, matching a quirk of the reference implementation this
    /// negotiation logic was distilled from.
    pub params: Vec<(String, String)>,
    /// 0-1000, where 1000 is `q=1.0`. Fixed-point avoids float
    /// comparison surprises when sorting.
    pub q: u16,
}

/// Parses and quality-sorts a header of the form
/// `token;param=value;q=0.8, token2;q=0.5`. Ties keep their original
/// relative order (the sort is stable and compares only on `q`).
pub fn parse_quality_list(header: &str) -> Vec<QualifiedValue> {
    let mut items: Vec<QualifiedValue> = header
        .split(',')
        .filter_map(|entry| parse_one(entry.trim()))
        .collect();
    items.sort_by(|a, b| b.q.cmp(&a.q));
    items
}

fn parse_one(entry: &str) -> Option<QualifiedValue> {
    if entry.is_empty() {
        return None;
    }
    let mut parts = entry.split(';').map(str::trim);
    let value = parts.next()?.to_string();
    let mut q: u16 = 1000;
    let mut params = Vec::new();

    for param in parts {
        if param.is_empty() {
            continue;
        }
        match param.split_once('=') {
            Some((key, val)) if key.trim().eq_ignore_ascii_case("q") => match parse_q(val.trim()) {
                Some(parsed) => q = parsed,
                None => {
                    q = 0;
                    params.push(("q".to_string(), val.trim().to_string()));
                }
            },
            Some((key, val)) => params.push((key.trim().to_string(), val.trim().to_string())),
            None => params.push((param.to_string(), String::new())),
        }
    }

    Some(QualifiedValue { value, params, q })
}

fn parse_q(raw: &str) -> Option<u16> {
    let f: f32 = raw.parse().ok()?;
    if !(0.0..=1.0).contains(&f) {
        return None;
    }
    Some((f * 1000.0).round() as u16)
}
