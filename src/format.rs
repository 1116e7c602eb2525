/// Format a metric for display. Unmeasured values (negative infinity)
/// render as `-inf`; everything else is rounded to one decimal place.
pub fn format_metric(value: f64) -> String {
    format_value(value, 1)
}

/// Format a metric with the given number of decimal places.
pub fn format_value(value: f64, precision: usize) -> String {
    if value == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        format!("{:.*}", precision, value)
    }
}

/// Number of characters a cell occupies in fixed-width output.
pub fn text_width(text: &str) -> usize {
    text.chars().count()
}

/// Pad `text` to `width` characters, on the left when `right_align` is set.
pub fn pad(text: &str, width: usize, right_align: bool) -> String {
    if right_align {
        format!("{:>width$}", text, width = width)
    } else {
        format!("{:<width$}", text, width = width)
    }
}
