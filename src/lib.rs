pub mod config;
pub mod editor;
pub mod editor_display;
pub mod error;
pub mod keymap;
pub mod link_ui;
pub mod locator;
pub mod render;
pub mod selection;
pub mod surface;
pub mod theme;
