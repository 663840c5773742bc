pub mod button_list;
pub mod button_settings;
pub mod profile_selector;
