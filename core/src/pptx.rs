//! Minimal PresentationML encoder for an [`ExportPlan`].
//!
//! One master, one blank layout, one theme. Every element becomes a text box
//! or a picture at its frame. Images are linked by URL, not embedded.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ExportError;
use crate::export::{Align, Element, ExportPlan, ExportedSlide, PresentationWriter, TextStyle};
use crate::layout::Frame;

const EMU_PER_INCH: f64 = 914_400.0;
const SLIDE_WIDTH_EMU: i64 = 9_144_000;
const SLIDE_HEIGHT_EMU: i64 = 6_858_000;

const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const NS_PKG_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const XML_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Writes `.pptx` files.
#[derive(Debug, Default, Clone, Copy)]
pub struct PptxWriter;

impl PresentationWriter for PptxWriter {
    fn extension(&self) -> &str {
        "pptx"
    }

    fn label(&self) -> &str {
        "PowerPoint"
    }

    fn write(&self, plan: &ExportPlan, path: &Path) -> Result<(), ExportError> {
        let mut zip = ZipWriter::new(File::create(path)?);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, body) in package_parts(plan) {
            zip.start_file(name, options)?;
            zip.write_all(body.as_bytes())?;
        }
        zip.finish()?;
        Ok(())
    }
}

/// Every part of the package as `(path inside the archive, xml)`.
pub fn package_parts(plan: &ExportPlan) -> Vec<(String, String)> {
    let mut parts = vec![
        ("[Content_Types].xml".to_string(), content_types(plan.slides.len())),
        ("_rels/.rels".to_string(), root_rels()),
        ("docProps/core.xml".to_string(), core_props(plan)),
        ("docProps/app.xml".to_string(), app_props(plan)),
        ("ppt/presentation.xml".to_string(), presentation(plan.slides.len())),
        (
            "ppt/_rels/presentation.xml.rels".to_string(),
            presentation_rels(plan.slides.len()),
        ),
        ("ppt/slideMasters/slideMaster1.xml".to_string(), slide_master()),
        (
            "ppt/slideMasters/_rels/slideMaster1.xml.rels".to_string(),
            relationships(&[
                ("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml", false),
                ("rId2", "theme", "../theme/theme1.xml", false),
            ]),
        ),
        ("ppt/slideLayouts/slideLayout1.xml".to_string(), slide_layout()),
        (
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels".to_string(),
            relationships(&[("rId1", "slideMaster", "../slideMasters/slideMaster1.xml", false)]),
        ),
        ("ppt/theme/theme1.xml".to_string(), theme()),
    ];

    for slide in &plan.slides {
        let (xml, rels) = slide_part(slide);
        let n = slide.number;
        parts.push((format!("ppt/slides/slide{n}.xml"), xml));
        parts.push((format!("ppt/slides/_rels/slide{n}.xml.rels"), rels));
    }
    parts
}

fn emu(inches: f64) -> i64 {
    (inches * EMU_PER_INCH).round() as i64
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

fn content_types(slide_count: usize) -> String {
    let ct = "application/vnd.openxmlformats-officedocument";
    let mut xml = format!(
        r#"{XML_HEADER}<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/ppt/presentation.xml" ContentType="{ct}.presentationml.presentation.main+xml"/><Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="{ct}.presentationml.slideMaster+xml"/><Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="{ct}.presentationml.slideLayout+xml"/><Override PartName="/ppt/theme/theme1.xml" ContentType="{ct}.theme+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/><Override PartName="/docProps/app.xml" ContentType="{ct}.extended-properties+xml"/>"#
    );
    for n in 1..=slide_count {
        xml.push_str(&format!(
            r#"<Override PartName="/ppt/slides/slide{n}.xml" ContentType="{ct}.presentationml.slide+xml"/>"#
        ));
    }
    xml.push_str("</Types>");
    xml
}

fn root_rels() -> String {
    format!(
        r#"{XML_HEADER}<Relationships xmlns="{NS_PKG_RELS}"><Relationship Id="rId1" Type="{REL}/officeDocument" Target="ppt/presentation.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/><Relationship Id="rId3" Type="{REL}/extended-properties" Target="docProps/app.xml"/></Relationships>"#
    )
}

/// `(id, relationship type, target, external)`
fn relationships(entries: &[(&str, &str, &str, bool)]) -> String {
    let mut xml = format!(r#"{XML_HEADER}<Relationships xmlns="{NS_PKG_RELS}">"#);
    for (id, kind, target, external) in entries {
        let target = escape(target);
        let mode = if *external { r#" TargetMode="External""# } else { "" };
        xml.push_str(&format!(
            r#"<Relationship Id="{id}" Type="{REL}/{kind}" Target="{target}"{mode}/>"#
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

fn core_props(plan: &ExportPlan) -> String {
    let props = &plan.properties;
    let title = escape(&props.title);
    let subject = escape(&props.subject);
    let author = escape(&props.author);
    format!(
        r#"{XML_HEADER}<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><dc:title>{title}</dc:title><dc:subject>{subject}</dc:subject><dc:creator>{author}</dc:creator></cp:coreProperties>"#
    )
}

fn app_props(plan: &ExportPlan) -> String {
    let company = escape(&plan.properties.company);
    let slides = plan.slides.len();
    format!(
        r#"{XML_HEADER}<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties"><Application>deckchat</Application><Company>{company}</Company><Slides>{slides}</Slides></Properties>"#
    )
}

fn presentation(slide_count: usize) -> String {
    let mut ids = String::new();
    for n in 1..=slide_count {
        let id = 255 + n;
        let rid = n + 2;
        ids.push_str(&format!(r#"<p:sldId id="{id}" r:id="rId{rid}"/>"#));
    }
    format!(
        r#"{XML_HEADER}<p:presentation xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst>{ids}</p:sldIdLst><p:sldSz cx="{SLIDE_WIDTH_EMU}" cy="{SLIDE_HEIGHT_EMU}"/><p:notesSz cx="{SLIDE_HEIGHT_EMU}" cy="{SLIDE_WIDTH_EMU}"/></p:presentation>"#
    )
}

fn presentation_rels(slide_count: usize) -> String {
    let targets: Vec<String> = (1..=slide_count)
        .map(|n| format!("slides/slide{n}.xml"))
        .collect();
    let ids: Vec<String> = (1..=slide_count).map(|n| format!("rId{}", n + 2)).collect();

    let mut entries = vec![
        ("rId1", "slideMaster", "slideMasters/slideMaster1.xml", false),
        ("rId2", "theme", "theme/theme1.xml", false),
    ];
    for (id, target) in ids.iter().zip(&targets) {
        entries.push((id.as_str(), "slide", target.as_str(), false));
    }
    relationships(&entries)
}

fn empty_tree() -> &'static str {
    r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>"#
}

fn slide_master() -> String {
    let tree = empty_tree();
    format!(
        r#"{XML_HEADER}<p:sldMaster xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"><p:cSld><p:spTree>{tree}</p:spTree></p:cSld><p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/><p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst></p:sldMaster>"#
    )
}

fn slide_layout() -> String {
    let tree = empty_tree();
    format!(
        r#"{XML_HEADER}<p:sldLayout xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}" type="blank" preserve="1"><p:cSld name="Blank"><p:spTree>{tree}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#
    )
}

fn theme() -> String {
    let colors = [
        ("dk1", "000000"),
        ("lt1", "FFFFFF"),
        ("dk2", "1F4788"),
        ("lt2", "EEECE1"),
        ("accent1", "4F81BD"),
        ("accent2", "C0504D"),
        ("accent3", "9BBB59"),
        ("accent4", "8064A2"),
        ("accent5", "4BACC6"),
        ("accent6", "F79646"),
        ("hlink", "0000FF"),
        ("folHlink", "800080"),
    ];
    let scheme: String = colors
        .iter()
        .map(|(name, rgb)| format!(r#"<a:{name}><a:srgbClr val="{rgb}"/></a:{name}>"#))
        .collect();
    let fill = r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#;
    let line = r#"<a:ln w="9525"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#;
    let effect = "<a:effectStyle><a:effectLst/></a:effectStyle>";
    let fonts = r#"<a:latin typeface="Arial"/><a:ea typeface=""/><a:cs typeface=""/>"#;
    format!(
        r#"{XML_HEADER}<a:theme xmlns:a="{NS_A}" name="deckchat"><a:themeElements><a:clrScheme name="deckchat">{scheme}</a:clrScheme><a:fontScheme name="deckchat"><a:majorFont>{fonts}</a:majorFont><a:minorFont>{fonts}</a:minorFont></a:fontScheme><a:fmtScheme name="deckchat"><a:fillStyleLst>{fill}{fill}{fill}</a:fillStyleLst><a:lnStyleLst>{line}{line}{line}</a:lnStyleLst><a:effectStyleLst>{effect}{effect}{effect}</a:effectStyleLst><a:bgFillStyleLst>{fill}{fill}{fill}</a:bgFillStyleLst></a:fmtScheme></a:themeElements></a:theme>"#
    )
}

/// Slide xml and its relationships part.
fn slide_part(slide: &ExportedSlide) -> (String, String) {
    let mut shapes = String::new();
    let mut images: Vec<(String, &str)> = Vec::new();

    for (index, element) in slide.elements.iter().enumerate() {
        // Id 1 is the group itself.
        let shape_id = index + 2;
        match element {
            Element::Text { text, frame, style } => {
                let paragraphs: Vec<String> = text
                    .split('\n')
                    .map(|line| paragraph(line, style, false))
                    .collect();
                shapes.push_str(&text_box(shape_id, frame, style, &paragraphs));
            }
            Element::Bullets {
                items,
                frame,
                style,
            } => {
                let paragraphs: Vec<String> =
                    items.iter().map(|item| paragraph(item, style, true)).collect();
                shapes.push_str(&text_box(shape_id, frame, style, &paragraphs));
            }
            Element::Image { url, frame } => {
                let rid = format!("rId{}", images.len() + 2);
                shapes.push_str(&picture(shape_id, frame, &rid));
                images.push((rid, url.as_str()));
            }
        }
    }

    let tree = empty_tree();
    let xml = format!(
        r#"{XML_HEADER}<p:sld xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"><p:cSld><p:spTree>{tree}{shapes}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#
    );

    let mut entries = vec![("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml", false)];
    for (rid, url) in &images {
        entries.push((rid.as_str(), "image", *url, true));
    }
    (xml, relationships(&entries))
}

fn xfrm(frame: &Frame) -> String {
    let (x, y, cx, cy) = (emu(frame.x), emu(frame.y), emu(frame.w), emu(frame.h));
    format!(r#"<a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#)
}

fn text_box(id: usize, frame: &Frame, style: &TextStyle, paragraphs: &[String]) -> String {
    let xfrm = xfrm(frame);
    let anchor = if style.valign_top { "t" } else { "ctr" };
    let body = paragraphs.concat();
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="Text {id}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr>{xfrm}<a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/></p:spPr><p:txBody><a:bodyPr wrap="square" rtlCol="0" anchor="{anchor}"/><a:lstStyle/>{body}</p:txBody></p:sp>"#
    )
}

fn paragraph(text: &str, style: &TextStyle, bullet: bool) -> String {
    let algn = match style.align {
        Some(Align::Left) => r#" algn="l""#,
        Some(Align::Center) => r#" algn="ctr""#,
        None => "",
    };
    let ppr = if bullet {
        format!(
            r#"<a:pPr marL="285750" indent="-285750"{algn}><a:buFont typeface="Arial"/><a:buChar char="&#8226;"/></a:pPr>"#
        )
    } else {
        format!("<a:pPr{algn}/>")
    };
    let size = style.font_size * 100;
    let bold = if style.bold { "1" } else { "0" };
    let color = escape(&style.color);
    let text = escape(text);
    format!(
        r#"<a:p>{ppr}<a:r><a:rPr lang="en-US" sz="{size}" b="{bold}" dirty="0"><a:solidFill><a:srgbClr val="{color}"/></a:solidFill></a:rPr><a:t>{text}</a:t></a:r></a:p>"#
    )
}

fn picture(id: usize, frame: &Frame, rid: &str) -> String {
    let xfrm = xfrm(frame);
    format!(
        r#"<p:pic><p:nvPicPr><p:cNvPr id="{id}" name="Image {id}"/><p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:link="{rid}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill><p:spPr>{xfrm}<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::build_plan;
    use chrono::NaiveDate;
    use deckchat_common::{ImagePosition, Slide, SlideContent};
    use std::io::Read;

    fn plan() -> ExportPlan {
        let slides = vec![
            Slide::new("Q&A <live>", SlideContent::bullets(["first", "second"])),
            Slide::new("Pictures", SlideContent::Text("one\ntwo".into()))
                .with_image("https://picsum.photos/800/600?a=1&b=2", ImagePosition::Left),
        ];
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        build_plan(&slides, None, date).unwrap()
    }

    fn part<'a>(parts: &'a [(String, String)], name: &str) -> &'a str {
        parts
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, body)| body.as_str())
            .unwrap()
    }

    #[test]
    fn inches_convert_to_emu() {
        assert_eq!(emu(1.0), 914_400);
        assert_eq!(emu(0.5), 457_200);
        assert_eq!(emu(10.0), SLIDE_WIDTH_EMU);
        assert_eq!(emu(7.5), SLIDE_HEIGHT_EMU);
    }

    #[test]
    fn every_slide_is_registered() {
        let parts = package_parts(&plan());

        let types = part(&parts, "[Content_Types].xml");
        assert!(types.contains(r#"PartName="/ppt/slides/slide1.xml""#));
        assert!(types.contains(r#"PartName="/ppt/slides/slide2.xml""#));
        let pres = part(&parts, "ppt/presentation.xml");
        assert!(pres.contains(r#"<p:sldId id="257" r:id="rId4"/>"#));
        let rels = part(&parts, "ppt/_rels/presentation.xml.rels");
        assert!(rels.contains(r#"Id="rId4" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide2.xml""#));
    }

    #[test]
    fn text_is_escaped_and_styled() {
        let parts = package_parts(&plan());
        let slide = part(&parts, "ppt/slides/slide1.xml");

        assert!(slide.contains("<a:t>Q&amp;A &lt;live&gt;</a:t>"));
        assert!(slide.contains(r#"sz="3200" b="1""#));
        assert!(slide.contains(r#"<a:buChar char="&#8226;"/>"#));
        // Title frame 0.5/0.7/9/0.8.
        assert!(slide.contains(r#"<a:off x="457200" y="640080"/><a:ext cx="8229600" cy="731520"/>"#));
    }

    #[test]
    fn images_are_linked_externally() {
        let parts = package_parts(&plan());
        let slide = part(&parts, "ppt/slides/slide2.xml");
        let rels = part(&parts, "ppt/slides/_rels/slide2.xml.rels");

        assert!(slide.contains(r#"<a:blip r:link="rId2"/>"#));
        assert!(slide.contains("<a:t>one</a:t>"));
        assert!(slide.contains("<a:t>two</a:t>"));
        assert!(rels.contains(
            r#"Target="https://picsum.photos/800/600?a=1&amp;b=2" TargetMode="External""#
        ));
    }

    #[test]
    fn writes_readable_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.pptx");

        PptxWriter.write(&plan(), &path).unwrap();

        let mut archive = zip::ZipArchive::new(File::open(&path).unwrap()).unwrap();
        let mut core = String::new();
        archive
            .by_name("docProps/core.xml")
            .unwrap()
            .read_to_string(&mut core)
            .unwrap();
        assert!(core.contains("<dc:creator>AI PowerPoint Generator</dc:creator>"));
        assert!(archive.by_name("ppt/theme/theme1.xml").is_ok());
    }
}
