pub mod apps;
pub mod creds;
pub mod deploy;
pub mod monitor;
pub mod new;
pub mod serve;
pub mod templates;
