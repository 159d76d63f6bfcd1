use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tokio::time::{interval, sleep, Duration, MissedTickBehavior};
use tracing::{error, info, warn};
mod config;
mod error;
mod model;
mod services;
mod utils;

use config::Config;
use services::{
    create_capture_backend, create_detector, create_window_tracker, resolve_with_retry,
    DetectionPipeline, FrameSource, MinifbSurface, OverlayRenderer, OverlaySurface,
    PipelineContext,
};

#[derive(Parser, Debug)]
#[command(name = "balls-overlay")]
#[command(about = "Прозрачный оверлей с детекциями шаров и луз поверх окна игры")]
struct Args {
    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = "balls-overlay.toml")]
    config: String,

    /// Режим сухого запуска (окна и захват эмулируются)
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования (перекрывает logging.level)
    #[arg(long)]
    log_level: Option<String>,

    /// Заголовок целевого окна (перекрывает window.target_title)
    #[arg(short, long)]
    target: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Загрузка конфигурации
    let mut config = Config::load(&args.config)?;
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    if let Some(target) = &args.target {
        config.window.target_title = target.clone();
    }
    if args.dry_run {
        config.apply_dry_run();
    }
    config.validate()?;

    // Инициализация системы логирования
    init_tracing(&config.logging.level, &config.logging.format)?;

    info!("Запуск balls-overlay v{}", env!("CARGO_PKG_VERSION"));
    info!("Конфигурация загружена из: {}", args.config);

    if args.dry_run {
        warn!("Режим сухого запуска - окна и захват эмулируются");
    }

    utils::environment::check_environment(args.dry_run)?;

    let config = Arc::new(config);
    let palette = config.display.palette()?;
    let tracker = create_window_tracker(&config)?;

    // Целевое окно обязано существовать на старте
    let target = match tracker.resolve(&config.window.target_title) {
        Ok(handle) => handle,
        Err(e) => {
            error!("{}", e);
            for hint in utils::environment::get_setup_hints(&config.window.target_title) {
                info!("{}", hint);
            }
            return Err(e).context("Целевое окно не найдено");
        }
    };
    info!("Целевое окно '{}': {}", config.window.target_title, target);

    // Окно оверлея и его дескриптор
    let mut surface = MinifbSurface::new(&config.overlay.title, config.overlay.width, config.overlay.height)?;
    surface.pump();
    let overlay = resolve_with_retry(
        tracker.as_ref(),
        &config.overlay.title,
        config.window.resolve_attempts,
        Duration::from_millis(config.window.resolve_interval_ms),
    )
    .await
    .context("Окно оверлея не найдено оконной системой")?;

    let ctx = PipelineContext::new(config.clone(), tracker, target, overlay);

    // Инициализация компонентов
    let capture = create_capture_backend(&config)?;
    let detector = create_detector(&config)?;
    let frames = FrameSource::new(&ctx, capture)?;
    let mut renderer = OverlayRenderer::new(ctx.subscriber(), palette);

    let worker = DetectionPipeline::new(&ctx, frames, detector)
        .spawn()
        .context("Не удалось запустить поток детекции")?;

    info!("Все компоненты инициализированы");

    // UI-цикл: тик рендера до закрытия окна, Escape или Ctrl+C
    let mut ticker = interval(Duration::from_millis(config.overlay.tick_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let ctrl_c = signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            result = &mut ctrl_c => {
                match result {
                    Ok(()) => info!("Получен сигнал завершения (Ctrl+C)"),
                    Err(err) => error!("Ошибка при ожидании сигнала завершения: {}", err),
                }
                break;
            }
            _ = ticker.tick() => {
                surface.pump();
                if !surface.is_open() {
                    info!("Окно оверлея закрыто");
                    break;
                }
                renderer.tick(&mut surface);
            }
        }
    }

    info!("Завершение работы...");

    // Сначала сигнал остановки, затем закрытие окна
    ctx.stop.signal();
    drop(surface);
    info!("Оверлей: показано {} кадров", renderer.presented());

    // Воркер не присоединяется: ждём его не дольше таймаута
    let shutdown_timeout = Duration::from_millis(config.pipeline.shutdown_timeout_ms);
    let shutdown_result = tokio::time::timeout(shutdown_timeout, async {
        while !worker.is_finished() {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await;

    match shutdown_result {
        Ok(_) => match worker.join() {
            Ok(stats) => info!(
                "Воркер детекции завершил работу корректно ({} кадров)",
                stats.processed
            ),
            Err(_) => error!("Воркер детекции завершился аварийно"),
        },
        Err(_) => warn!("Таймаут при завершении воркера детекции"),
    }

    info!("balls-overlay завершил работу");
    Ok(())
}

fn init_tracing(level: &str, format: &str) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))?;

    let compact = (format == "compact").then(|| fmt::layer().compact());
    let full = (format != "compact").then(fmt::layer);

    tracing_subscriber::registry()
        .with(filter)
        .with(compact)
        .with(full)
        .init();

    Ok(())
}
