mod xdg_root;

pub use xdg_root::{config_home, global_config_path};
