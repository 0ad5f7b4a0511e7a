use regex::Regex;
use std::sync::OnceLock;

static CERT_NUMBER: OnceLock<Regex> = OnceLock::new();

/// Next certificate number in a bulk run.
///
/// `NO: 13.024/IMPCT/V/2025` becomes `NO: 13.025/IMPCT/V/2025`: the digits
/// after the first `<major>.` are incremented and keep their zero padding,
/// growing a digit only on overflow. Numbers without the
/// `<major>.<minor>/<suffix>` shape come back unchanged.
pub fn increment_certificate_number(number: &str) -> String {
    let re = CERT_NUMBER.get_or_init(|| {
        Regex::new(r"(\d+)\.(\d+)(/.*)").expect("certificate number pattern is valid")
    });

    let Some(minor) = re.captures(number).and_then(|caps| caps.get(2)) else {
        return number.to_string();
    };

    format!(
        "{}{}{}",
        &number[..minor.start()],
        increment_digits(minor.as_str()),
        &number[minor.end()..]
    )
}

/// Decimal increment on a digit string, keeping its width unless it carries out.
fn increment_digits(digits: &str) -> String {
    let mut out: Vec<u8> = digits.bytes().collect();
    let mut i = out.len();
    loop {
        if i == 0 {
            out.insert(0, b'1');
            break;
        }
        i -= 1;
        if out[i] == b'9' {
            out[i] = b'0';
        } else {
            out[i] += 1;
            break;
        }
    }
    out.into_iter().map(char::from).collect()
}
