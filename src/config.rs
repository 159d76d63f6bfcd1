use crate::model::{DetectionKind, Rect};
use crate::services::batch_queue::DEFAULT_CAPACITY;
use crate::utils::color::{parse_hex_color, Palette};
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub logging: LoggingConfig,
    pub window: WindowConfig,
    pub overlay: OverlayConfig,
    pub capture: CaptureConfig,
    pub detector: DetectorConfig,
    pub pipeline: PipelineConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WindowConfig {
    /// xcap | xdotool
    pub backend: String,
    pub target_title: String,
    pub resolve_attempts: u32,
    pub resolve_interval_ms: u64,
    pub dry_run: DryRunWindowsConfig,
}

/// Геометрия окон, которую эмулирует dry-run трекер (экранные координаты)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DryRunWindowsConfig {
    pub target: Rect,
    pub overlay: Rect,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OverlayConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub tick_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CaptureConfig {
    /// xcap
    pub backend: String,
    pub fps: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DetectorConfig {
    /// color
    pub backend: String,
    /// Файл модели детектора (для color - TOML с цветовыми диапазонами классов)
    #[serde(default)]
    pub model: Option<PathBuf>,
    pub confidence_threshold: f32,
    pub min_area: u32,
    pub max_area_ratio: f32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    pub queue_capacity: usize,
    pub worker_yield_ms: u64,
    pub shutdown_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DisplayConfig {
    pub colors: ColorsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ColorsConfig {
    pub ball: String,
    pub hole: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "compact".to_string(),
            },
            window: WindowConfig {
                backend: "xcap".to_string(),
                target_title: "abc.png".to_string(),
                resolve_attempts: 20,
                resolve_interval_ms: 50,
                dry_run: DryRunWindowsConfig {
                    target: Rect::new(100, 100, 740, 580),
                    overlay: Rect::new(0, 0, 1280, 960),
                },
            },
            overlay: OverlayConfig {
                title: "balls-overlay".to_string(),
                width: 1280,
                height: 960,
                tick_ms: 10,
            },
            capture: CaptureConfig {
                backend: "xcap".to_string(),
                fps: 30,
            },
            detector: DetectorConfig {
                backend: "color".to_string(),
                model: None,
                confidence_threshold: 0.5,
                min_area: 30,
                max_area_ratio: 0.05,
            },
            pipeline: PipelineConfig {
                queue_capacity: DEFAULT_CAPACITY,
                worker_yield_ms: 20,
                shutdown_timeout_ms: 2000,
            },
            display: DisplayConfig {
                colors: ColorsConfig {
                    ball: "#00FF00".to_string(),
                    hole: "#FF00FF".to_string(),
                },
            },
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("BALLS_").split("__"));

        let config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.validate()?;

        Ok(config)
    }

    /// Переключить все внешние коллабораторы в режим эмуляции
    pub fn apply_dry_run(&mut self) {
        self.window.backend = "dry_run".to_string();
        self.capture.backend = "dry_run".to_string();
    }

    pub fn validate(&self) -> Result<()> {
        // Валидация настроек логирования
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "compact" | "full" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        // Окна
        match self.window.backend.as_str() {
            "xcap" | "xdotool" | "dry_run" => {}
            _ => anyhow::bail!("Неверный бэкенд трекера окон: {}", self.window.backend),
        }

        if self.window.target_title.trim().is_empty() {
            anyhow::bail!("window.target_title не может быть пустым");
        }

        if self.window.resolve_attempts == 0 {
            anyhow::bail!("window.resolve_attempts должно быть больше 0");
        }

        // Оверлей
        if self.overlay.title.trim().is_empty() {
            anyhow::bail!("overlay.title не может быть пустым");
        }

        if self.overlay.width == 0 || self.overlay.height == 0 {
            anyhow::bail!(
                "Неверный размер оверлея: {}x{}",
                self.overlay.width,
                self.overlay.height
            );
        }

        if self.overlay.tick_ms == 0 {
            anyhow::bail!("overlay.tick_ms должно быть больше 0");
        }

        // Захват
        match self.capture.backend.as_str() {
            "xcap" | "dry_run" => {}
            _ => anyhow::bail!("Неверный бэкенд захвата: {}", self.capture.backend),
        }

        if self.capture.fps == 0 || self.capture.fps > 240 {
            anyhow::bail!("capture.fps должно быть в диапазоне 1..=240, получено {}", self.capture.fps);
        }

        // Детектор
        match self.detector.backend.as_str() {
            "color" => {}
            _ => anyhow::bail!("Неверный бэкенд детектора: {}", self.detector.backend),
        }

        if !(0.0..=1.0).contains(&self.detector.confidence_threshold) {
            anyhow::bail!(
                "detector.confidence_threshold должен быть в [0, 1], получено {}",
                self.detector.confidence_threshold
            );
        }

        if !(0.0..=1.0).contains(&self.detector.max_area_ratio) || self.detector.max_area_ratio == 0.0 {
            anyhow::bail!(
                "detector.max_area_ratio должен быть в (0, 1], получено {}",
                self.detector.max_area_ratio
            );
        }

        // Конвейер
        if self.pipeline.queue_capacity == 0 {
            anyhow::bail!("pipeline.queue_capacity должно быть больше 0");
        }

        // Цвета
        self.display.palette()?;

        Ok(())
    }
}

impl DisplayConfig {
    pub fn palette(&self) -> Result<Palette> {
        let ball = parse_hex_color(&self.colors.ball)
            .with_context(|| format!("Неверный цвет для {}", DetectionKind::Ball))?;
        let hole = parse_hex_color(&self.colors.hole)
            .with_context(|| format!("Неверный цвет для {}", DetectionKind::Hole))?;
        Ok(Palette::new(ball, hole))
    }
}
