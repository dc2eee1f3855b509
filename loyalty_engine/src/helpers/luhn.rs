/// Validates a string of decimal digits against the Luhn checksum.
///
/// Digits are scanned from the right, and every second digit is doubled (subtracting 9 if the result exceeds 9). The
/// number is valid iff the sum of all digits is a multiple of 10.
///
/// Any character that is not an ASCII digit makes the whole string invalid. The empty string is invalid.
pub fn is_valid_luhn(number: &str) -> bool {
    if number.is_empty() {
        return false;
    }
    let mut sum = 0u32;
    for (i, c) in number.chars().rev().enumerate() {
        let Some(mut digit) = c.to_digit(10) else {
            return false;
        };
        if i % 2 == 1 {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum += digit;
    }
    sum % 10 == 0
}
