use crate::eval::Value;

// Preview and price rendering group thousands with commas; fractional
// digits are never grouped.

pub fn value(v: &Value) -> String {
    match *v {
        Value::Int(n) => int(n),
        Value::Float(x) => float(x),
    }
}

pub fn int(n: i64) -> String {
    let grouped = group(&n.unsigned_abs().to_string());
    if n < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

pub fn float(x: f64) -> String {
    let plain = plain_float(x);
    // Scientific and non-finite renderings pass through untouched
    if plain.contains('e') || plain.contains("inf") || plain.contains("NaN") {
        return plain;
    }
    let (sign, rest) = match plain.strip_prefix('-') {
        Some(stripped) => ("-", stripped),
        None => ("", plain.as_str()),
    };
    let (int_part, frac_part) = match rest.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rest, None),
    };
    let mut out = String::new();
    out.push_str(sign);
    out.push_str(&group(int_part));
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

// Shortest decimal that round-trips, so 120.0 stays "120.0" and float
// noise like 0.30000000000000004 is shown as-is
pub fn plain_float(x: f64) -> String {
    format!("{:?}", x)
}

pub fn price(n: &serde_json::Number) -> String {
    if let Some(v) = n.as_i64() {
        int(v)
    } else if let Some(v) = n.as_u64() {
        group(&v.to_string())
    } else if let Some(v) = n.as_f64() {
        float(v)
    } else {
        n.to_string()
    }
}

fn group(digits: &str) -> String {
    let bytes = digits.as_bytes();
    let mut out = String::with_capacity(bytes.len() + bytes.len() / 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 && (bytes.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(*b as char);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_group_thousands() {
        assert_eq!(int(0), "0");
        assert_eq!(int(999), "999");
        assert_eq!(int(1000), "1,000");
        assert_eq!(int(1234567), "1,234,567");
        assert_eq!(int(-1234567), "-1,234,567");
    }

    #[test]
    fn floats_group_only_the_integral_digits() {
        assert_eq!(float(2.0), "2.0");
        assert_eq!(float(1234.5), "1,234.5");
        assert_eq!(float(-1234.5), "-1,234.5");
        assert_eq!(float(0.05), "0.05");
        assert_eq!(float(1234567.25), "1,234,567.25");
    }

    #[test]
    fn plain_float_matches_the_roi_contract() {
        assert_eq!(plain_float(120.0), "120.0");
        assert_eq!(plain_float(0.5), "0.5");
        assert_eq!(plain_float(-3.25), "-3.25");
    }

    #[test]
    fn values_render_by_kind() {
        assert_eq!(value(&Value::Int(2000000)), "2,000,000");
        assert_eq!(value(&Value::Float(0.5)), "0.5");
    }

    #[test]
    fn prices_keep_their_json_kind() {
        assert_eq!(price(&serde_json::Number::from(43250)), "43,250");
        let fractional = serde_json::Number::from_f64(43250.23).unwrap();
        assert_eq!(price(&fractional), "43,250.23");
    }
}
