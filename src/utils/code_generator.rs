use rand::Rng;
use rand::rngs::OsRng;

/// 兑换码字母表：去掉易混淆的 0/O、1/I/L
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// 生成指定长度的兑换码（例如 "K7F9X2BD"），员工需要口头念出或手动输入
pub fn generate_redemption_code(length: usize) -> String {
    let mut rng = OsRng;
    (0..length)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// 规范化员工输入的兑换码
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_redemption_code() {
        let code = generate_redemption_code(8);
        assert_eq!(code.len(), 8);
        assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_alphabet_has_no_ambiguous_characters() {
        for c in [b'0', b'O', b'1', b'I', b'L'] {
            assert!(!CODE_ALPHABET.contains(&c), "{} in alphabet", c as char);
        }
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("  k7f9x2bd \n"), "K7F9X2BD");
    }
}
