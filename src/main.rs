use std::env;
use std::fs::File;
use std::io::BufWriter;
use std::process;

use tiffdec::{Result, TiffReader};

fn main() -> Result<()> {
    let mut args = env::args().skip(1);
    let input = match args.next() {
        Some(path) => path,
        None => {
            eprintln!("usage: tiffdec <input.tif> [output.pnm]");
            process::exit(2);
        }
    };
    let output = args.next();

    let mut reader = TiffReader::open(&input)?;
    let tiff = reader.read()?;

    println!("{}", tiff);

    if let Some(ifd) = tiff.main_ifd() {
        let raster = reader.read_image(ifd)?;
        println!(
            "Decoded: {} x {}, {} channel(s){}",
            raster.width,
            raster.height,
            raster.channels,
            if raster.packed { ", bit-packed" } else { "" }
        );

        if let Some(path) = output {
            let file = File::create(&path)?;
            let mut out = BufWriter::new(file);
            raster.write_pnm(&mut out)?;
            println!("Wrote {}", path);
        }
    }

    Ok(())
}
