//! Dashboard Page Module
//! Assembles the rendered chart images into a single static HTML page.

use std::io;
use std::path::{Path, PathBuf};

const PAGE_TITLE: &str = "COVID-19 in Argentina";
const PAGE_SUBTITLE: &str = "Metrics from 01/01/2020 to 08/07/2021";

/// Write `index.html` into `out_dir`, embedding the given charts in order.
/// Each entry is `(title, image file name)`; the images are expected to sit
/// next to the page.
pub fn write_index(out_dir: &Path, charts: &[(&str, &str)]) -> io::Result<PathBuf> {
    let mut figures = String::new();
    for (title, file) in charts {
        figures.push_str(&format!(
            "    <figure>\n      <img src=\"{file}\" alt=\"{title}\">\n    </figure>\n"
        ));
    }

    let html = format!(
        "<!DOCTYPE html>\n\
         <html lang=\"en\">\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <title>{PAGE_TITLE}</title>\n\
         <style>\n\
         body {{ background-color: rgb(10,10,10); color: rgb(255,255,255); font-family: sans-serif; text-align: center; }}\n\
         figure {{ margin: 24px auto; }}\n\
         img {{ max-width: 92%; }}\n\
         </style>\n\
         </head>\n\
         <body>\n\
         <h1>{PAGE_TITLE}</h1>\n\
         <p>{PAGE_SUBTITLE}</p>\n\
         {figures}\
         </body>\n\
         </html>\n"
    );

    let path = out_dir.join("index.html");
    std::fs::write(&path, html)?;
    Ok(path)
}
