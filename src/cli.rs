// CLI definitions using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "extkbd")]
#[command(author, version, about = "External USB keyboard bridge")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file path (default: ~/.config/extkbd/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Use an in-memory host loaded from a JSON fixture instead of the OS
    #[arg(long, global = true, value_name = "FILE")]
    pub fixture: Option<PathBuf>,

    /// Log filter (error, warn, info, debug, trace or a RUST_LOG directive)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan attached USB devices for keyboards
    #[command(visible_alias = "s")]
    Scan {
        /// Print the records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Request access to a keyboard and wait for the answer
    #[command(visible_aliases = ["perm", "p"])]
    RequestPermission {
        /// Device ID as reported by `scan` (e.g. /dev/bus/usb/001/004)
        device_id: String,
        /// Seconds to wait for the permission result
        #[arg(long, default_value = "30")]
        wait: u64,
    },

    /// Print decoded keyboard input until Ctrl-C
    #[command(visible_alias = "l")]
    Listen {
        /// evdev device to read (default: terminal input)
        #[arg(short, long, value_name = "PATH")]
        device: Option<PathBuf>,
    },

    /// Print attach, detach and permission events until Ctrl-C
    #[command(visible_alias = "w")]
    Watch,

    /// Run the JSON-lines message channel on stdin/stdout
    Serve {
        /// evdev keyboard feeding key events (first keyboard when given without a path)
        #[arg(short, long, value_name = "PATH")]
        input: Option<Option<PathBuf>>,
    },

    /// List every USB device with its classification
    #[command(visible_alias = "ls")]
    List,
}
