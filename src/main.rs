// Hide console window on Windows in release builds
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

//! Markpane - Main Entry Point
//!
//! A split-pane Markdown editor with live preview, rich-text clipboard copy,
//! and PDF export. Built with Rust and egui.

mod app;
mod error;
mod export;
mod files;
mod markdown;
mod preview;
mod state;
mod theme;
mod ui;

use app::MarkpaneApp;
use log::info;

/// Application name constant.
const APP_NAME: &str = "Markpane";

fn main() -> eframe::Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Starting {}", APP_NAME);

    let viewport = eframe::egui::ViewportBuilder::default()
        .with_title(APP_NAME)
        .with_inner_size([1200.0, 800.0])
        .with_min_inner_size([500.0, 300.0]);

    let native_options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        APP_NAME,
        native_options,
        Box::new(|cc| Ok(Box::new(MarkpaneApp::new(cc)))),
    )
}
