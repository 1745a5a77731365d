use uuid::Uuid;

pub const RESET_CODE_LEN: usize = 6;

const RESET_CODE_ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Short uppercase code (digits and A-Z) for password resets
pub fn generate_reset_code() -> String {
    // the last 6 bytes of a v4 UUID carry no version/variant bits
    let bytes = Uuid::new_v4().into_bytes();
    let mut n = bytes[10..].iter().fold(0u64, |acc, &b| (acc << 8) | b as u64);

    let mut code = String::with_capacity(RESET_CODE_LEN);
    for _ in 0..RESET_CODE_LEN {
        code.push(RESET_CODE_ALPHABET[(n % 36) as usize] as char);
        n /= 36;
    }
    code
}

/// Current time in epoch millis (the users.json format)
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_reset_code_shape() {
        let code = generate_reset_code();
        assert_eq!(code.len(), RESET_CODE_LEN);
        assert!(code
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_reset_codes_differ() {
        assert_ne!(generate_reset_code(), generate_reset_code());
    }

    #[test]
    fn test_reset_codes_use_letters_past_f() {
        let seen: HashSet<char> = (0..200)
            .flat_map(|_| generate_reset_code().chars().collect::<Vec<_>>())
            .collect();

        assert!(seen.iter().any(|c| ('G'..='Z').contains(c)));
    }
}
