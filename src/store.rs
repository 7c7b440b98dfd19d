//! 常用直播間與全域設定的持久化文件。
//!
//! 文件整份存成 JSON；每一次變更後立即整份覆寫（先寫暫存檔再 rename）。

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{info, warn};

use crate::{
    error::{AppErr, AppResult},
    theme::Theme,
    utils::validate::{
        validate_color, validate_font_size, validate_interval, validate_mode, validate_theme,
    },
};

pub const MAX_ROOMS: usize = 20;

pub const DEFAULT_TIME_STEP: f64 = 5.0;
pub const DEFAULT_COLOR: &str = "#FFFFFF";
pub const DEFAULT_FONT_SIZE: u32 = 25;
pub const DEFAULT_MODE: u8 = 1;

/* ------------ 全域設定 ------------ */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub time_step: f64,
    pub color: String,
    pub font_size: u32,
    pub mode: u8,
    pub theme: Theme,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            time_step: DEFAULT_TIME_STEP,
            color: DEFAULT_COLOR.to_owned(),
            font_size: DEFAULT_FONT_SIZE,
            mode: DEFAULT_MODE,
            theme: Theme::default(),
        }
    }
}

/// 使用者在表單上輸入的原始字串；`None` 表示該欄位不變。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsPatch {
    pub time_step: Option<String>,
    pub color: Option<String>,
    pub font_size: Option<String>,
    pub mode: Option<String>,
    pub theme: Option<String>,
}

/* ------------ 單一直播間 ------------ */
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomProfile {
    #[serde(default)]
    pub csrf: String,
    #[serde(default)]
    pub csrf_token: String,
    #[serde(default)]
    pub sessdata: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub danmus: Vec<String>,
}

/* ------------ 整份文件 ------------ */
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// 插入順序即淘汰順序
    #[serde(default, deserialize_with = "null_as_default")]
    pub common_rooms: IndexMap<String, RoomProfile>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub settings: Settings,
}

fn null_as_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

impl Document {
    /// 新房間排到最後；既有房間只更新憑證，位置與常用彈幕不變
    pub fn upsert_room(&mut self, room_id: &str, csrf: &str, csrf_token: &str, sessdata: &str) {
        let room = self.common_rooms.entry(room_id.to_owned()).or_default();
        room.csrf = csrf.to_owned();
        room.csrf_token = csrf_token.to_owned();
        room.sessdata = sessdata.to_owned();
        self.enforce_capacity();
    }

    /// 「保存配置」：四個欄位都必填，並可一併覆寫常用彈幕清單
    pub fn save_room(
        &mut self,
        room_id: &str,
        csrf: &str,
        csrf_token: &str,
        sessdata: &str,
        danmus: Option<Vec<String>>,
    ) -> AppResult<()> {
        for (field, value) in [
            ("room_id", room_id),
            ("csrf", csrf),
            ("csrf_token", csrf_token),
            ("sessdata", sessdata),
        ] {
            if value.trim().is_empty() {
                return Err(AppErr::MissingField(field));
            }
        }
        self.upsert_room(room_id, csrf, csrf_token, sessdata);
        if let (Some(list), Some(room)) = (danmus, self.common_rooms.get_mut(room_id)) {
            room.danmus = list;
        }
        Ok(())
    }

    /// 回傳該房間原本是否存在
    pub fn delete_room(&mut self, room_id: &str) -> bool {
        self.common_rooms.shift_remove(room_id).is_some()
    }

    pub fn add_message(&mut self, room_id: &str, text: &str) -> AppResult<()> {
        let room = self
            .common_rooms
            .get_mut(room_id)
            .ok_or_else(|| AppErr::InvalidRoom(room_id.to_owned()))?;
        if text.trim().is_empty() {
            return Err(AppErr::EmptyMessage);
        }
        room.danmus.push(text.to_owned());
        Ok(())
    }

    pub fn delete_message(&mut self, room_id: &str, index: usize) -> AppResult<String> {
        let room = self
            .common_rooms
            .get_mut(room_id)
            .ok_or_else(|| AppErr::InvalidRoom(room_id.to_owned()))?;
        let len = room.danmus.len();
        if index >= len {
            return Err(AppErr::IndexOutOfRange { index, len });
        }
        Ok(room.danmus.remove(index))
    }

    /// 先驗證全部欄位，任何一欄失敗都不會動到文件
    pub fn update_settings(&mut self, patch: &SettingsPatch) -> AppResult<()> {
        let time_step = patch.time_step.as_deref().map(validate_interval).transpose()?;
        let color = patch.color.as_deref().map(validate_color).transpose()?;
        let font_size = patch.font_size.as_deref().map(validate_font_size).transpose()?;
        let mode = patch.mode.as_deref().map(validate_mode).transpose()?;
        let theme = patch.theme.as_deref().map(validate_theme).transpose()?;

        let s = &mut self.settings;
        if let Some(v) = time_step { s.time_step = v; }
        if let Some(v) = color { s.color = v; }
        if let Some(v) = font_size { s.font_size = v; }
        if let Some(v) = mode { s.mode = v; }
        if let Some(v) = theme { s.theme = v; }
        Ok(())
    }

    fn enforce_capacity(&mut self) {
        while self.common_rooms.len() > MAX_ROOMS {
            if let Some((evicted, _)) = self.common_rooms.shift_remove_index(0) {
                info!(room_id = %evicted, "room list full, dropped oldest room");
            }
        }
    }
}

/* ------------ 檔案層 ------------ */
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    doc: Document,
}

impl ConfigStore {
    /// 檔案不存在 ⇒ 以預設值建立並寫出；存在但壞掉 ⇒ ConfigCorrupt
    pub fn load(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        let doc = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str::<Document>(&text).map_err(|source| {
                AppErr::ConfigCorrupt { path: path.clone(), source }
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let store = Self { path, doc: Document::default() };
                // 第一次寫不出去也照樣用預設值啟動，下一次變更會再試
                match store.save() {
                    Ok(()) => info!(path = %store.path.display(), "created default config"),
                    Err(e) => warn!(path = %store.path.display(), error = %e, "cannot create config, using defaults"),
                }
                return Ok(store);
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, doc })
    }

    /// 同 [`load`](Self::load)；`recover` 時把壞檔改名成 `<path>.corrupt`，改用預設值
    pub fn load_or_recover(path: impl Into<PathBuf>, recover: bool) -> AppResult<Self> {
        let path = path.into();
        match Self::load(&path) {
            Err(AppErr::ConfigCorrupt { source, .. }) if recover => {
                let backup = sibling(&path, "corrupt");
                fs::rename(&path, &backup)?;
                warn!(
                    error = %source,
                    backup = %backup.display(),
                    "config was corrupt, moved aside and starting with defaults"
                );
                Self::load(path)
            }
            other => other,
        }
    }

    pub fn save(&self) -> AppResult<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let payload = serde_json::to_string_pretty(&self.doc)?;
        let tmp = sibling(&self.path, "tmp");
        fs::write(&tmp, payload)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn settings(&self) -> &Settings {
        &self.doc.settings
    }

    pub fn room(&self, room_id: &str) -> Option<&RoomProfile> {
        self.doc.common_rooms.get(room_id)
    }

    pub fn rooms(&self) -> impl Iterator<Item = (&String, &RoomProfile)> {
        self.doc.common_rooms.iter()
    }

    /* ── 以下每個變更都立即存檔 ── */

    pub fn upsert_room(
        &mut self,
        room_id: &str,
        csrf: &str,
        csrf_token: &str,
        sessdata: &str,
    ) -> AppResult<()> {
        self.doc.upsert_room(room_id, csrf, csrf_token, sessdata);
        self.save()
    }

    pub fn save_room(
        &mut self,
        room_id: &str,
        csrf: &str,
        csrf_token: &str,
        sessdata: &str,
        danmus: Option<Vec<String>>,
    ) -> AppResult<()> {
        self.doc.save_room(room_id, csrf, csrf_token, sessdata, danmus)?;
        self.save()
    }

    pub fn delete_room(&mut self, room_id: &str) -> AppResult<bool> {
        let existed = self.doc.delete_room(room_id);
        if existed {
            self.save()?;
        }
        Ok(existed)
    }

    pub fn add_message(&mut self, room_id: &str, text: &str) -> AppResult<()> {
        self.doc.add_message(room_id, text)?;
        self.save()
    }

    pub fn delete_message(&mut self, room_id: &str, index: usize) -> AppResult<String> {
        let removed = self.doc.delete_message(room_id, index)?;
        self.save()?;
        Ok(removed)
    }

    pub fn update_settings(&mut self, patch: &SettingsPatch) -> AppResult<()> {
        self.doc.update_settings(patch)?;
        self.save()
    }

    pub fn change_theme(&mut self, name: &str) -> AppResult<Theme> {
        let theme = validate_theme(name)?;
        self.doc.settings.theme = theme;
        self.save()?;
        Ok(theme)
    }
}

fn sibling(path: &Path, ext: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}
