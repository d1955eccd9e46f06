use serde::Serialize;

pub const MIN_LENGTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strength {
    Weak,
    Medium,
    Strong,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PasswordStrength {
    pub strength: Strength,
    pub score: u8,
    pub message: String,
}

/// Wi-Fi password meter: one point each for length >= 12, upper, lower, digit and symbol.
pub fn password_strength(password: &str) -> PasswordStrength {
    if password.chars().count() < MIN_LENGTH {
        return PasswordStrength {
            strength: Strength::Weak,
            score: 0,
            message: format!("Weak - Too short (min {MIN_LENGTH} characters)"),
        };
    }

    let checks = [
        password.chars().count() >= 12,
        password.chars().any(|c| c.is_ascii_uppercase()),
        password.chars().any(|c| c.is_ascii_lowercase()),
        password.chars().any(|c| c.is_ascii_digit()),
        password.chars().any(|c| !c.is_ascii_alphanumeric()),
    ];
    let score = checks.iter().filter(|passed| **passed).count() as u8;

    let strength = match score {
        4.. => Strength::Strong,
        3 => Strength::Medium,
        _ => Strength::Weak,
    };
    let message = match strength {
        Strength::Strong => "Strong",
        Strength::Medium => "Medium",
        Strength::Weak => "Weak",
    };

    PasswordStrength {
        strength,
        score,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_passwords_are_weak() {
        let result = password_strength("Ab1!");
        assert_eq!(result.strength, Strength::Weak);
        assert!(result.message.contains("Too short"));
    }

    #[test]
    fn scoring_tiers() {
        assert_eq!(password_strength("abcdefgh").strength, Strength::Weak);
        assert_eq!(password_strength("abcdefg1").strength, Strength::Weak);
        assert_eq!(password_strength("Abcdefg1").strength, Strength::Medium);
        assert_eq!(password_strength("Abcdefg1!").strength, Strength::Strong);
        let long = password_strength("Correct-Horse-42");
        assert_eq!(long.score, 5);
        assert_eq!(long.strength, Strength::Strong);
    }
}
