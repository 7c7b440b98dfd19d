//! 使用者輸入的欄位驗證；全部為純函式。

use std::time::Duration;

use crate::theme::Theme;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("interval must be a number greater than 0, got {0:?}")]
    InvalidInterval(String),

    #[error("font size must be an integer greater than 0, got {0:?}")]
    InvalidFontSize(String),

    #[error("mode must be an integer between 1 and 9, got {0:?}")]
    InvalidMode(String),

    #[error("color must look like #RRGGBB, got {0:?}")]
    InvalidColor(String),

    #[error("unknown theme {0:?}")]
    UnknownTheme(String),
}

impl ValidationError {
    /// 對應到設定文件中的欄位名稱
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidInterval(_) => "time_step",
            Self::InvalidFontSize(_) => "font_size",
            Self::InvalidMode(_) => "mode",
            Self::InvalidColor(_) => "color",
            Self::UnknownTheme(_) => "theme",
        }
    }
}

/// 只接受能換成非零 `Duration` 的秒數，太大或小到捨入成 0 都拒絕
pub fn validate_interval(s: &str) -> Result<f64, ValidationError> {
    match s.trim().parse::<f64>() {
        Ok(v) if interval_duration(v).is_some() => Ok(v),
        _ => Err(ValidationError::InvalidInterval(s.into())),
    }
}

pub fn interval_duration(secs: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(secs).ok().filter(|d| !d.is_zero())
}

pub fn validate_font_size(s: &str) -> Result<u32, ValidationError> {
    match s.trim().parse::<u32>() {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(ValidationError::InvalidFontSize(s.into())),
    }
}

pub fn validate_mode(s: &str) -> Result<u8, ValidationError> {
    match s.trim().parse::<u8>() {
        Ok(v) if (1..=9).contains(&v) => Ok(v),
        _ => Err(ValidationError::InvalidMode(s.into())),
    }
}

/// 統一成大寫 `#RRGGBB`
pub fn validate_color(s: &str) -> Result<String, ValidationError> {
    let t = s.trim();
    match color_value(t) {
        Some(_) => Ok(t.to_ascii_uppercase()),
        None => Err(ValidationError::InvalidColor(s.into())),
    }
}

pub fn validate_theme(s: &str) -> Result<Theme, ValidationError> {
    Theme::from_name(s.trim()).ok_or_else(|| ValidationError::UnknownTheme(s.into()))
}

/// `#FFFFFF` → 16777215
pub fn color_value(color: &str) -> Option<u32> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_boundaries() {
        assert!(validate_interval("0").is_err());
        assert!(validate_interval("-1").is_err());
        assert!(validate_interval("abc").is_err());
        assert!(validate_interval("NaN").is_err());
        assert_eq!(validate_interval("0.001"), Ok(0.001));
        assert_eq!(validate_interval(" 5 "), Ok(5.0));
    }

    #[test]
    fn interval_must_fit_a_sleep() {
        assert!(validate_interval("1e20").is_err());
        assert!(validate_interval("1e-12").is_err());
        assert!(validate_interval("inf").is_err());
        for s in ["0.001", "5", "86400"] {
            let v = validate_interval(s).unwrap();
            assert!(interval_duration(v).is_some_and(|d| !d.is_zero()));
        }
        assert_eq!(interval_duration(1e20), None);
        assert_eq!(interval_duration(1e-12), None);
    }

    #[test]
    fn mode_boundaries() {
        assert!(validate_mode("0").is_err());
        assert!(validate_mode("10").is_err());
        assert_eq!(validate_mode("1"), Ok(1));
        assert_eq!(validate_mode("9"), Ok(9));
    }

    #[test]
    fn font_size_must_be_positive_integer() {
        assert!(validate_font_size("0").is_err());
        assert!(validate_font_size("-3").is_err());
        assert!(validate_font_size("2.5").is_err());
        assert_eq!(validate_font_size("25"), Ok(25));
    }

    #[test]
    fn errors_name_their_field() {
        assert_eq!(validate_interval("x").unwrap_err().field(), "time_step");
        assert_eq!(validate_mode("x").unwrap_err().field(), "mode");
        assert_eq!(validate_font_size("x").unwrap_err().field(), "font_size");
    }

    #[test]
    fn color_to_integer() {
        assert_eq!(color_value("#FFFFFF"), Some(16_777_215));
        assert_eq!(color_value("#000000"), Some(0));
        assert_eq!(color_value("#e38691"), Some(0xE38691));
        assert_eq!(color_value("FFFFFF"), None);
        assert_eq!(color_value("#FFF"), None);
        assert_eq!(validate_color("#a50c12"), Ok("#A50C12".into()));
    }

    #[test]
    fn theme_names() {
        assert_eq!(validate_theme("yoyi"), Ok(Theme::Yoyi));
        assert!(validate_theme("nope").is_err());
    }
}
