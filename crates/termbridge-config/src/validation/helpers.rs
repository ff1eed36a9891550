use std::fmt::Display;

/// Record `name` as invalid unless `min <= value <= max`.
pub(crate) fn check_range<T>(errors: &mut Vec<String>, name: &str, value: T, (min, max): (T, T))
where
    T: PartialOrd + Display,
{
    if value < min || value > max {
        errors.push(format!("{name} = {value} is out of range [{min}, {max}]"));
    }
}
