//! Horse Race - Tauri Backend
//!
//! Owns the race simulation and asset loading; the webview pulls one
//! snapshot per frame and renders it.

pub mod race_server;

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use race_server::assets::{self, AssetError, AssetKind, ModelSummary};
use race_server::race::{Arrival, RaceConfig, RaceSnapshot};
use race_server::simulation::{RaceEvent, RaceServer, ServerStats};
use race_server::RaceKey;
use tauri::path::BaseDirectory;
use tauri::{AppHandle, Emitter, Manager, State};

/// Forward a keyboard event from the webview
#[tauri::command]
fn key_pressed(server: State<'_, Mutex<RaceServer>>, key: String) -> Result<Option<RaceKey>, String> {
    let mut server = server.lock().map_err(|e| e.to_string())?;
    Ok(server.press_key(&key))
}

/// Advance the race by the time since the last frame and return the frame to draw
#[tauri::command]
fn tick(server: State<'_, Mutex<RaceServer>>) -> Result<RaceSnapshot, String> {
    let mut server = server.lock().map_err(|e| e.to_string())?;
    Ok(server.frame())
}

/// Get current race snapshot without advancing simulation
#[tauri::command]
fn get_snapshot(server: State<'_, Mutex<RaceServer>>) -> Result<RaceSnapshot, String> {
    let server = server.lock().map_err(|e| e.to_string())?;
    Ok(server.get_snapshot())
}

/// Get track-end arrivals in order
#[tauri::command]
fn get_results(server: State<'_, Mutex<RaceServer>>) -> Result<Vec<Arrival>, String> {
    let server = server.lock().map_err(|e| e.to_string())?;
    Ok(server.get_results())
}

/// Get server statistics
#[tauri::command]
fn get_stats(server: State<'_, Mutex<RaceServer>>) -> Result<ServerStats, String> {
    let server = server.lock().map_err(|e| e.to_string())?;
    Ok(server.get_stats())
}

/// Get the race layout the renderer needs (track, camera, model paths)
#[tauri::command]
fn get_config(server: State<'_, Mutex<RaceServer>>) -> Result<RaceConfig, String> {
    let server = server.lock().map_err(|e| e.to_string())?;
    Ok(server.config().clone())
}

/// Summary of a model that has already loaded, including its on-disk path
///
/// Lets the renderer catch up on loads that finished before it subscribed.
#[tauri::command]
fn get_model(server: State<'_, Mutex<RaceServer>>, kind: AssetKind) -> Result<Option<ModelSummary>, String> {
    let server = server.lock().map_err(|e| e.to_string())?;
    Ok(server.model(kind).cloned())
}

/// Absolute path of a model: the bundled resource, else the working directory in dev
///
/// The renderer fetches the same file through the asset protocol.
fn resolve_asset(app: &AppHandle, relative: &Path) -> Result<PathBuf, AssetError> {
    let bundled = app
        .path()
        .resolve(relative, BaseDirectory::Resource)
        .map_err(|e| AssetError::Resolve {
            path: relative.to_path_buf(),
            reason: e.to_string(),
        })?;
    if bundled.exists() {
        return Ok(bundled);
    }
    std::fs::canonicalize(relative).map_err(|source| AssetError::Io {
        path: relative.to_path_buf(),
        source,
    })
}

/// Load one model in the background and hand the outcome to the race server
fn spawn_asset_load(app: AppHandle, kind: AssetKind, relative: PathBuf) {
    tauri::async_runtime::spawn_blocking(move || {
        let loaded = resolve_asset(&app, &relative).and_then(|path| assets::load_model(&path));
        let event = match &loaded {
            Ok(model) => RaceEvent::AssetLoaded(kind, model.clone()),
            Err(err) => RaceEvent::AssetFailed(kind, err.to_string()),
        };

        let server = app.state::<Mutex<RaceServer>>();
        match server.lock() {
            Ok(mut server) => server.dispatch(event),
            Err(e) => {
                log::error!("Race server unavailable, dropping {:?} load: {}", kind, e);
                return;
            }
        }

        if let Ok(model) = loaded {
            if let Err(e) = app.emit(kind.event_name(), &model) {
                log::warn!("Failed to notify frontend of {:?} model: {}", kind, e);
            }
        }
    });
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    let config = RaceConfig::default();
    let config_check = config.validate();
    let paths = config.assets.clone();

    tauri::Builder::default()
        .manage(Mutex::new(RaceServer::new(config)))
        .setup(move |app| {
            if cfg!(debug_assertions) {
                app.handle().plugin(
                    tauri_plugin_log::Builder::default()
                        .level(log::LevelFilter::Info)
                        .build(),
                )?;
            }
            config_check?;
            for kind in [AssetKind::Character, AssetKind::Track] {
                spawn_asset_load(app.handle().clone(), kind, paths.path_of(kind).to_path_buf());
            }
            log::info!("Horse race server initialized");
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            key_pressed,
            tick,
            get_snapshot,
            get_results,
            get_stats,
            get_config,
            get_model,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
