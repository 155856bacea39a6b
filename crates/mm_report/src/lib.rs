//! Plain-text mapping file renderer (spec §6 "Output — mapping file").
//!
//! Pure rendering lives here; no pipeline logic, no archive reading. The
//! format is fixed: three sections, slash-form binary names for classes,
//! `owner.name+descriptor` for methods, `owner.name:descriptor` for fields —
//! which happen to be exactly what `ClassKey`/`MethodKey`/`FieldKey::as_str`
//! already produce, so rendering is a direct walk of the bundle's maps.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use mm_pipeline::ResultBundle;

/// Renders a `ResultBundle` as the plain-text mapping file described in
/// spec §6. Sections are always emitted in class/method/field order, blank
/// line between sections, even when a section is empty.
pub fn render(bundle: &ResultBundle) -> String {
    let mut out = String::new();

    out.push_str("## Class Mappings\n");
    for (src, tgt) in &bundle.classes {
        out.push_str(src.as_str());
        out.push_str(" -> ");
        out.push_str(tgt.as_str());
        out.push('\n');
    }
    out.push('\n');

    out.push_str("## Method Mappings\n");
    for (src, tgt) in &bundle.methods {
        out.push_str(src.as_str());
        out.push_str(" -> ");
        out.push_str(tgt.as_str());
        out.push('\n');
    }
    out.push('\n');

    out.push_str("## Field Mappings\n");
    for (src, tgt) in &bundle.fields {
        out.push_str(src.as_str());
        out.push_str(" -> ");
        out.push_str(tgt.as_str());
        out.push('\n');
    }

    out
}

/// Writes `render(bundle)` to `path`, atomically: written to a sibling
/// `.tmp` file then renamed into place, so a crash mid-write never leaves a
/// truncated mapping file on disk.
pub fn write_to(bundle: &ResultBundle, path: &Path) -> io::Result<()> {
    let text = render(bundle);
    let tmp = tmp_path_for(path);
    {
        let mut f = fs::File::create(&tmp)?;
        f.write_all(text.as_bytes())?;
        if !text.ends_with('\n') {
            f.write_all(b"\n")?;
        }
        f.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

fn tmp_path_for(final_path: &Path) -> PathBuf {
    let mut s = final_path.as_os_str().to_owned();
    s.push(".tmp");
    PathBuf::from(s)
}
