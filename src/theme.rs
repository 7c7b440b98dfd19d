use serde::{Deserialize, Serialize};
use tracing::warn;

/// 介面主題；每個主題對應一個按鈕顏色與背景圖。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Theme {
    Sxwz,
    Queenie,
    Bekki,
    #[default]
    Lian,
    Yoyi,
}

impl Theme {
    pub const ALL: [Theme; 5] = [Theme::Sxwz, Theme::Queenie, Theme::Bekki, Theme::Lian, Theme::Yoyi];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Theme::Sxwz => "sxwz",
            Theme::Queenie => "queenie",
            Theme::Bekki => "bekki",
            Theme::Lian => "lian",
            Theme::Yoyi => "yoyi",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Theme::Sxwz => "#A50C12",    // 禧運紅
            Theme::Queenie => "#A1D29A", // 淡蘋果綠
            Theme::Bekki => "#A7C9D3",   // 冰川湖泊
            Theme::Lian => "#E38691",    // 淺梨粉
            Theme::Yoyi => "#E3BA09",    // 鬱金
        }
    }

    /// 相對於素材目錄的背景圖路徑
    pub fn background(self) -> &'static str {
        match self {
            Theme::Sxwz => "photos/background_shining.jpg",
            Theme::Queenie => "photos/background_queenie.png",
            Theme::Bekki => "photos/background_bekki.png",
            Theme::Lian => "photos/background_lian.png",
            Theme::Yoyi => "photos/background_yoyi.png",
        }
    }
}

/* 舊檔或手改過的主題名稱 ⇒ 退回預設，不讓載入失敗 */
impl From<String> for Theme {
    fn from(name: String) -> Self {
        Theme::from_name(&name).unwrap_or_else(|| {
            warn!(theme = %name, "unknown theme in config, falling back to default");
            Theme::default()
        })
    }
}

impl From<Theme> for String {
    fn from(t: Theme) -> Self {
        t.name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_theme_falls_back_to_lian() {
        let t: Theme = serde_json::from_str("\"rainbow\"").unwrap();
        assert_eq!(t, Theme::Lian);
    }

    #[test]
    fn serializes_as_name() {
        assert_eq!(serde_json::to_string(&Theme::Bekki).unwrap(), "\"bekki\"");
        let t: Theme = serde_json::from_str("\"sxwz\"").unwrap();
        assert_eq!(t, Theme::Sxwz);
    }
}
