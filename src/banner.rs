use std::io::{self, Write};
use tui_banner::{Align, Banner, Fill, Gradient, Palette};

/// Print the startup banner
pub fn print_banner() {
    let banner = Banner::new("ytqueue")
        .unwrap()
        .gradient(Gradient::diagonal(Palette::from_hex(&[
            "#FF3D3D",
            "#FF8A00",
            "#FFD000",
        ])))
        .fill(Fill::Keep)
        .align(Align::Left)
        .padding(0);

    println!("{}", banner.render());
    println!(
        "  {} {}",
        console::style("Per-channel yt-dlp batches").white().bold(),
        console::style("state saved after every video, one batch per channel per round").dim()
    );
    println!();

    let _ = io::stdout().flush();
}
