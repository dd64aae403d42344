use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use log::info;
use tokio::signal;

use seedfs::fuse::mount::mount_seed_vfs;
use seedfs::r#gen::layout::BlockLayout;
use seedfs::registry::FileRegistry;
use seedfs::vfs::fs::SeedVfs;

#[derive(Parser, Debug)]
#[command(name = "seedfs")]
#[command(about = "Serve deterministic pseudo-random test files over FUSE", long_about = None)]
struct Args {
    /// Slash-delimited list of name,size,seed file specs,
    /// e.g. testfile_1M,1M,1/testfile_1G,1G,0x02
    #[arg(value_name = "FILE_SPECS")]
    specs: String,
    /// Empty directory to mount the filesystem on
    #[arg(value_name = "MOUNT_POINT")]
    mountpoint: PathBuf,
    /// Allow other users to access the mount
    #[arg(long)]
    allow_other: bool,
    /// Use a privileged mount instead of fusermount3 (requires root)
    #[arg(long)]
    privileged: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    // Any malformed spec aborts here, before anything is mounted.
    let registry = Arc::new(
        FileRegistry::from_spec_list(&args.specs).context("invalid file-spec list")?,
    );
    for file in registry.iter() {
        info!("serving {} ({} bytes, seed {:#x})", file.name, file.size, file.seed);
    }

    let fs = SeedVfs::new(BlockLayout::default(), registry);
    let mut mount_handle = mount_seed_vfs(fs, &args.mountpoint, args.allow_other, args.privileged)
        .await
        .with_context(|| {
            format!(
                "mount at {} failed (is fusermount3 available?)",
                args.mountpoint.display()
            )
        })?;
    info!("seedfs mounted at {}", args.mountpoint.display());

    let handle = &mut mount_handle;
    tokio::select! {
        res = handle => res?,
        _ = signal::ctrl_c() => {
            info!("unmounting");
            mount_handle.unmount().await?;
        }
    }
    Ok(())
}
