pub mod cluster;
pub mod config;
pub mod disk;
pub mod image;
pub mod ip;
pub mod keypair;
pub mod lb;
pub mod regions;
pub mod sg;
pub mod tag;
pub mod vm;
pub mod vpc;
