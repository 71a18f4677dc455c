use crate::error::{AppError, AppResult};

pub const CODE_LEN: usize = 6;

/// Generate a fixed-width numeric confirmation code ("042517").
///
/// Sent out-of-band to prove email ownership before token issuance. Not a
/// cryptographic credential on its own: it is short-lived in spirit and only
/// usable together with the matching username.
pub fn generate_confirmation_code() -> AppResult<String> {
    let mut buf = [0u8; 4];
    getrandom::getrandom(&mut buf)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("RNG failure: {}", e)))?;
    let n = u32::from_le_bytes(buf) % 1_000_000;
    Ok(format!("{:06}", n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_is_fixed_width_numeric() {
        for _ in 0..50 {
            let code = generate_confirmation_code().unwrap();
            assert_eq!(code.len(), CODE_LEN);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn codes_vary() {
        let codes: std::collections::HashSet<String> = (0..20)
            .map(|_| generate_confirmation_code().unwrap())
            .collect();
        // 20 draws from a million values colliding into one is not credible.
        assert!(codes.len() > 1);
    }
}
