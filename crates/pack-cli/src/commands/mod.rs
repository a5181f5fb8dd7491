//! Command implementations for packsync

pub mod pack;
pub mod script;
pub mod update;
pub mod upstream;

pub use pack::{run_add_pack, run_list, run_remove_pack, run_show};
pub use script::{RunTarget, run_compile, run_script};
pub use update::{run_check, run_check_all, run_update, run_update_all};
pub use upstream::{run_out_changelist, run_out_version, run_self_check};
