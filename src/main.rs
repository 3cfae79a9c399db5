//! Binary entry point for the `bootcodec` command-line tool.
//!
//! Drives the library's decoders from an ordinary host OS for testing and
//! inspection; none of this runs in the boot environment itself.

use std::fs;

use anyhow::{Context, Result};
use clap::Parser;

use bootcodec::cli::args::{resolve_display_level, Command, ParsedArgs};
use bootcodec::cli::constants::set_display_level;
use bootcodec::heap::Heap;
use bootcodec::{displaylevel, gzip_uncompress, load_payload_chain, xz_decode};

fn main() -> Result<()> {
    let args = ParsedArgs::parse();
    set_display_level(resolve_display_level(&args));

    match args.command {
        Command::XzDecode { input, output } => run_xz_decode(&input, &output),
        Command::GzipDecode { input, output } => run_gzip_decode(&input, &output),
        Command::Inspect { payload } => run_inspect(&payload),
    }
}

fn run_xz_decode(input: &std::path::Path, output: &std::path::Path) -> Result<()> {
    let source = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    displaylevel!(3, "xz-decode: probing size of {}\n", input.display());
    let sized = xz_decode(&source, None).context("sizing xz stream")?;

    let mut dest = vec![0u8; sized.output_produced];
    let outcome = xz_decode(&source, Some(&mut dest)).context("decoding xz stream")?;
    displaylevel!(
        2,
        "xz-decode: {} bytes -> {} bytes\n",
        outcome.input_consumed,
        outcome.output_produced
    );

    fs::write(output, &dest[..outcome.output_produced])
        .with_context(|| format!("writing {}", output.display()))?;
    Ok(())
}

fn run_gzip_decode(input: &std::path::Path, output: &std::path::Path) -> Result<()> {
    let source = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    // gzip carries its uncompressed size in the trailer; read it up front to
    // size the destination buffer in one pass, mirroring tinf's callers.
    if source.len() < 4 {
        anyhow::bail!("{} is too short to be a gzip member", input.display());
    }
    let declared_size = u32::from_le_bytes(source[source.len() - 4..].try_into().unwrap()) as usize;

    let mut dest = vec![0u8; declared_size];
    let produced =
        gzip_uncompress(&mut dest, &source).map_err(|e| anyhow::anyhow!("gzip decode: {e}"))?;
    displaylevel!(2, "gzip-decode: produced {produced} bytes\n");

    fs::write(output, &dest[..produced])
        .with_context(|| format!("writing {}", output.display()))?;
    Ok(())
}

fn run_inspect(payload: &std::path::Path) -> Result<()> {
    let stream = fs::read(payload).with_context(|| format!("reading {}", payload.display()))?;
    let mut backing = vec![0u8; stream.len() * 8 + (4 << 20)];
    let mut heap = Heap::new(&mut backing);
    let outcome = load_payload_chain(&stream, &mut heap).context("walking payload chain")?;

    for record in &outcome.records {
        println!("{:?} @ 0x{:x} ({} bytes)", record.kind, record.offset, record.size);
    }
    if let (Some(off), Some(size)) = (outcome.fdt_offset, outcome.fdt_size) {
        displaylevel!(2, "fdt: {size} bytes at heap offset 0x{off:x}\n");
    }
    if let (Some(off), Some(size)) = (outcome.kernel_offset, outcome.kernel_size) {
        displaylevel!(2, "kernel: {size} bytes at heap offset 0x{off:x}\n");
    }
    if let (Some(off), Some(size)) = (outcome.initramfs_offset, outcome.initramfs_size) {
        displaylevel!(2, "initramfs: {size} bytes at heap offset 0x{off:x}\n");
    }
    Ok(())
}
