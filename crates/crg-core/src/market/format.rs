//! Display helpers for market figures.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
}

/// Insert thousands separators into the integer part of a plain decimal string.
fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// USD price: two decimals from $1 up, four to six decimals below.
pub fn format_price(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let abs = value.abs();

    let fixed = if abs < 1.0 {
        let mut s = format!("{:.6}", abs);
        // keep at least four fraction digits
        while s.ends_with('0') && s.len() > "0.0000".len() {
            s.pop();
        }
        s
    } else {
        format!("{:.2}", abs)
    };

    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    format!("{}${}.{}", sign, group_thousands(int_part), frac_part)
}

/// Compact USD amount such as `$1.3T` or `$345.7M`.
pub fn format_compact(value: f64) -> String {
    const UNITS: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];

    let sign = if value < 0.0 { "-" } else { "" };
    let abs = value.abs();

    let mut scaled = None;
    for (i, (div, suffix)) in UNITS.iter().enumerate() {
        if abs >= *div {
            let rounded = (abs / div * 10.0).round() / 10.0;
            // 999.96B rounds up into the next unit
            if rounded >= 1000.0 && i > 0 {
                let (up_div, up_suffix) = UNITS[i - 1];
                scaled = Some(((abs / up_div * 10.0).round() / 10.0, up_suffix));
            } else {
                scaled = Some((rounded, *suffix));
            }
            break;
        }
    }

    let (number, suffix) = match scaled {
        Some(pair) => pair,
        None => {
            let rounded = abs.round();
            if rounded >= 1000.0 {
                (1.0, "K")
            } else {
                (rounded, "")
            }
        }
    };

    let mut text = format!("{:.1}", number);
    if text.ends_with(".0") {
        text.truncate(text.len() - 2);
    }
    format!("{}${}{}", sign, text, suffix)
}

/// Absolute 24h change with two decimals, plus its direction.
pub fn format_change(percent: f64) -> (String, Trend) {
    let trend = if percent >= 0.0 { Trend::Up } else { Trend::Down };
    (format!("{:.2}%", percent.abs()), trend)
}
