//! End-to-end conversion tests over captured-style pages of every layout era.

use std::collections::{HashMap, HashSet};
use std::fs;

use docsplit::dom::{parse_html, parse_html_bytes};
use docsplit::{
    ConvertConfig, ConvertedDocument, Diagnostics, DocumentSource, Error, SchemaVariant,
    convert_batch, convert_document, convert_to_dir, detect,
};
use regex::Regex;
use tempfile::TempDir;

const FIXTURES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

fn fixture_path(name: &str) -> String {
    format!("{}/{}", FIXTURES_DIR, name)
}

fn convert_fixture(name: &str, config: &ConvertConfig) -> (ConvertedDocument, Diagnostics) {
    let bytes = fs::read(fixture_path(name)).expect("fixture should exist");
    let dom = parse_html_bytes(&bytes);
    convert_document(&dom, "master", config).expect("fixture should convert")
}

fn filenames(doc: &ConvertedDocument) -> Vec<&str> {
    doc.sections.iter().map(|s| s.filename.as_str()).collect()
}

fn section<'a>(doc: &'a ConvertedDocument, filename: &str) -> &'a str {
    doc.sections
        .iter()
        .find(|s| s.filename == filename)
        .map(|s| s.text.as_str())
        .unwrap_or_else(|| panic!("no section {filename}"))
}

/// Every `](file.md#id)` link must point at a written file that holds `id`.
fn assert_links_resolve(doc: &ConvertedDocument) {
    let link = Regex::new(r"\]\(([^)#\s]+\.md)#([^)\s]+)\)").unwrap();
    let locations: HashMap<&str, &str> = doc.toc.entries().map(|(e, f)| (e.id.as_str(), f)).collect();

    for section in &doc.sections {
        for caps in link.captures_iter(&section.text) {
            let (file, id) = (&caps[1], &caps[2]);
            assert_ne!(file, section.filename, "same-file link kept a filename: {}", &caps[0]);
            assert_eq!(
                locations.get(id).copied(),
                Some(file),
                "{} in {} points at the wrong file",
                &caps[0],
                section.filename
            );
        }
    }
}

#[test]
fn test_modern_fixture() {
    let (doc, diagnostics) = convert_fixture("modern.html", &ConvertConfig::default());

    assert_eq!(doc.toc.variant, SchemaVariant::Modern);
    assert_eq!(
        filenames(&doc),
        [
            "00-introduction.md",
            "01-hello-world.md",
            "02-values.md",
            "03-builtin-functions.md",
            "04-grammar.md",
        ]
    );
    let orders: Vec<usize> = doc.sections.iter().map(|s| s.order).collect();
    assert_eq!(orders, [0, 1, 2, 3, 4]);

    let intro = section(&doc, "00-introduction.md");
    assert!(intro.starts_with("## Introduction\n\n"));
    assert!(intro.contains(
        "Zig is a general-purpose programming language and toolchain for maintaining \
         **robust**, *optimal* and **reusable** software."
    ));
    assert!(intro.contains("[Hello World](01-hello-world.md#Hello-World)"));
    assert!(intro.contains("[values](02-values.md#Values)"));
    assert!(intro.contains("[primitive types](02-values.md#Primitive-Types)"));
    assert!(!intro.contains('§'));

    assert_eq!(
        section(&doc, "01-hello-world.md"),
        "## Hello World\n\
         \n\
         **`hello.zig`:**\n\
         ```zig\n\
         const std = @import(\"std\");\n\
         \n\
         pub fn main() !void {\n    const stdout = std.io.getStdOut().writer();\n    \
         try stdout.print(\"Hello, {s}!\\n\", .{\"world\"});\n\
         }\n\
         ```\n\
         \n\
         **Shell:**\n\
         ```shell\n\
         $ zig build-exe hello.zig\n\
         $ ./hello\n\
         Hello, world!\n\
         ```\n\
         \n\
         See also: [the introduction](00-introduction.md#Introduction).\n"
    );

    let values = section(&doc, "02-values.md");
    assert!(values.contains("[Primitive Types](#Primitive-Types)"));
    assert!(values.contains("### Primitive Types\n"));
    assert!(values.contains(
        "| Type | C Equivalent | Description |\n\
         | --- | --- | --- |\n\
         | `i8` | `int8_t` | signed 8-bit integer |\n\
         | `comptime_int` | (none) | Only allowed for [comptime](#comptime)-known values \\| literal |\n"
    ));
    assert!(!values.contains("<caption>"));
    assert!(values.contains(
        "> **Note:** Because Zig source code is \
         [UTF-8 encoded](https://en.wikipedia.org/wiki/UTF-8), non-ASCII bytes may appear in literals.\n"
    ));
    assert!(values.contains("#### Escape Sequences\n\n**`\\n`**\n: Newline\n\n**`\\t`**\n: Tab\n"));

    let builtins = section(&doc, "03-builtin-functions.md");
    assert!(builtins.contains("prefixed with `@`."));
    assert!(builtins.contains(
        "```zig\n@addWithOverflow(a: anytype, b: anytype) struct { @TypeOf(a, b), u1 }\n```\n"
    ));
    assert!(builtins.contains("[Primitive Types](02-values.md#Primitive-Types)"));

    let grammar = section(&doc, "04-grammar.md");
    assert!(grammar.contains(
        "**grammar.peg:**\n```peg\nRoot <- skip container_doc_comment? ContainerMembers eof\n```\n"
    ));
    assert!(grammar.contains("[missing section](#MissingId)"));

    let unresolved: Vec<(&str, usize)> = diagnostics
        .unresolved_links
        .iter()
        .map(|w| (w.id.as_str(), w.occurrences))
        .collect();
    assert_eq!(unresolved, [("comptime", 1), ("Pointers", 1), ("MissingId", 2)]);
    assert_eq!(diagnostics.unresolved_links[2].first_file, "04-grammar.md");

    assert_links_resolve(&doc);
}

#[test]
fn test_legacy_fixture() {
    let (doc, diagnostics) = convert_fixture("legacy.html", &ConvertConfig::default());

    assert_eq!(doc.toc.variant, SchemaVariant::Legacy);
    assert_eq!(
        filenames(&doc),
        ["00-introduction.md", "01-hello-world.md", "02-comments.md", "03-values.md"]
    );

    let intro = section(&doc, "00-introduction.md");
    assert!(intro.starts_with("# Introduction\n"));
    assert!(intro.contains("[Hello World](01-hello-world.md#Hello-World)"));

    let hello = section(&doc, "01-hello-world.md");
    assert!(hello.contains("**`hello.zig`:**\n```zig\nconst std = @import(\"std\");\n"));
    assert!(hello.contains("```shell\n$ zig build-exe hello.zig\n"));
    assert!(!hello.contains("\nhello.zig\n"));

    let comments = section(&doc, "02-comments.md");
    assert!(comments.contains("**`comments.zig`:**\n```zig\n// Comments in Zig start with"));
    assert!(comments.contains("## Doc comments\n"));
    assert!(comments.contains("[Values](03-values.md#Values)"));

    let values = section(&doc, "03-values.md");
    assert!(values.contains("```\n@sizeOf(comptime T: type) comptime_int\n```\n"));
    assert!(values.contains("- Integers: `i32`, `u8`\n- Floats\n  - `f32`\n  - `f64`\n"));
    assert!(values.contains("[doc comments](02-comments.md#Doc-comments)"));

    assert!(diagnostics.is_empty());
    assert_links_resolve(&doc);
}

#[test]
fn test_older_fixture_with_colliding_titles() {
    let (doc, diagnostics) = convert_fixture("older.html", &ConvertConfig::default());

    assert_eq!(doc.toc.variant, SchemaVariant::Older);
    assert_eq!(
        filenames(&doc),
        ["00-introduction.md", "01-hello-world.md", "02-overview.md", "03-overview-2.md"]
    );

    let intro = section(&doc, "00-introduction.md");
    assert!(intro.contains("[overview](02-overview.md#Overview)"));

    let hello = section(&doc, "01-hello-world.md");
    assert!(hello.contains("pub fn main() -> %void {"));

    let second = section(&doc, "03-overview-2.md");
    assert!(second.starts_with("## Overview\n"));
    assert!(second.contains("[Hello World](01-hello-world.md#Hello-World)"));
    assert!(second.contains("[itself](#Overview-2)"));

    assert!(diagnostics.is_empty());
    assert_links_resolve(&doc);
}

#[test]
fn test_ancient_fixture_windows_1252() {
    let (doc, diagnostics) = convert_fixture("ancient.html", &ConvertConfig::default());

    assert_eq!(doc.toc.variant, SchemaVariant::Ancient);
    assert_eq!(filenames(&doc), ["00-overview.md", "01-types.md", "02-café.md"]);

    let overview = section(&doc, "00-overview.md");
    assert!(overview.starts_with("## Overview\n"));
    assert!(overview.contains("café-friendly"));
    assert!(overview.contains("[types](01-types.md#Types)"));

    let types = section(&doc, "01-types.md");
    assert!(types.contains("| bool | true or false |\n| --- | --- |\n| void | zero bits |\n"));

    assert!(diagnostics.is_empty());
    assert_links_resolve(&doc);
}

#[test]
fn test_five_sections_produce_six_files() {
    let mut html = String::from(r#"<nav aria-labelledby="table-of-contents"><ul>"#);
    let titles = ["Alpha", "Bravo", "Charlie", "Delta", "Echo"];
    for title in titles {
        html.push_str(&format!(r##"<li><a href="#{title}">{title}</a></li>"##));
    }
    html.push_str("</ul></nav>");
    for title in titles {
        html.push_str(&format!(r#"<h2 id="{title}">{title}</h2><p>About {title}.</p>"#));
    }

    let dir = TempDir::new().unwrap();
    let source = DocumentSource::new("0.1.0", html);
    let report = convert_to_dir(&source, dir.path(), &ConvertConfig::default()).unwrap();
    assert_eq!(report.files.len(), 6);

    let mut names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(
        names,
        [
            "00-alpha.md",
            "01-bravo.md",
            "02-charlie.md",
            "03-delta.md",
            "04-echo.md",
            "README.md",
        ]
    );

    let index = fs::read_to_string(dir.path().join("README.md")).unwrap();
    assert!(index.contains("# Language Reference Documentation (Version 0.1.0)"));
    assert!(index.contains("1. [Alpha](00-alpha.md)\n"));
    assert!(index.contains("5. [Echo](04-echo.md)\n"));
    assert_eq!(
        fs::read_to_string(dir.path().join("02-charlie.md")).unwrap(),
        "## Charlie\n\nAbout Charlie.\n"
    );
}

#[test]
fn test_batch_with_one_failing_version() {
    let good = fs::read(fixture_path("modern.html")).unwrap();
    let broken = r##"<nav aria-labelledby="table-of-contents"><ul>
        <li><a href="#Present">Present</a></li>
        <li><a href="#Ghost">Ghost</a></li>
    </ul></nav>
    <h2 id="Present">Present</h2><p>Only one heading exists.</p>"##;

    let sources = vec![
        DocumentSource::new("0.10.0", good.clone()),
        DocumentSource::new("0.11.0", broken),
        DocumentSource::new("master", good),
    ];

    let dir = TempDir::new().unwrap();
    let summary = convert_batch(&sources, dir.path(), &ConvertConfig::default());

    assert_eq!(summary.failure_count(), 1);
    let (version, error) = summary.failures().next().unwrap();
    assert_eq!(version, "0.11.0");
    assert!(matches!(error, Error::SectionExtraction { id } if id == "Ghost"));

    for version in ["0.10.0", "master"] {
        let out = dir.path().join(format!("docs-{version}"));
        let written: HashSet<String> = fs::read_dir(&out)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(written.len(), 6, "{version}");
        assert!(written.contains("README.md"));
        assert!(written.contains("04-grammar.md"));
    }

    let reports: Vec<_> = summary.succeeded().map(|r| r.version.as_str()).collect();
    assert_eq!(reports, ["0.10.0", "master"]);
}

#[test]
fn test_conversion_is_deterministic() {
    let bytes = fs::read(fixture_path("modern.html")).unwrap();
    let config = ConvertConfig::default();

    let first = convert_document(&parse_html_bytes(&bytes), "master", &config).unwrap();
    let second = convert_document(&parse_html_bytes(&bytes), "master", &config).unwrap();

    assert_eq!(first.0.sections, second.0.sections);
    assert_eq!(first.1, second.1);
}

#[test]
fn test_detection_is_deterministic() {
    for (name, expected) in [
        ("modern.html", SchemaVariant::Modern),
        ("legacy.html", SchemaVariant::Legacy),
        ("older.html", SchemaVariant::Older),
        ("ancient.html", SchemaVariant::Ancient),
    ] {
        let bytes = fs::read(fixture_path(name)).unwrap();
        for _ in 0..3 {
            let dom = parse_html_bytes(&bytes);
            assert_eq!(detect(&dom).unwrap().variant, expected, "{name}");
        }
    }
}

#[test]
fn test_heading_anchors_cover_cross_file_targets() {
    let config = ConvertConfig::default().with_heading_anchors(true);
    let (doc, _) = convert_fixture("modern.html", &config);
    let link = Regex::new(r"\]\(([^)#\s]+\.md)#([^)\s]+)\)").unwrap();

    let mut checked = 0;
    for section in &doc.sections {
        for caps in link.captures_iter(&section.text) {
            let target = doc.sections.iter().find(|s| s.filename == caps[1]).unwrap();
            let anchor = format!("<a id=\"{}\"></a>", &caps[2]);
            assert!(target.text.contains(&anchor), "{anchor} missing in {}", target.filename);
            checked += 1;
        }
    }
    assert!(checked > 0);
}

#[test]
fn test_unrecognized_and_empty_documents() {
    let dom = parse_html("<html><body><h1>Plain page</h1></body></html>");
    assert!(matches!(
        convert_document(&dom, "master", &ConvertConfig::default()),
        Err(Error::UnrecognizedSchema)
    ));

    let dom = parse_html(r#"<div id="toc"><ul><li>No links here</li></ul></div>"#);
    assert!(matches!(
        convert_document(&dom, "master", &ConvertConfig::default()),
        Err(Error::EmptyToc {
            variant: SchemaVariant::Legacy
        })
    ));
}

#[test]
fn test_inline_code_links_left_literal() {
    let dom = parse_html(
        r##"<nav aria-labelledby="table-of-contents"><ul>
            <li><a href="#Alpha">Alpha</a></li>
            <li><a href="#Beta">Beta</a></li>
        </ul></nav>
        <h2 id="Alpha">Alpha</h2>
        <p>Write <code>[text](#Beta)</code> and <code>[x](#Nope)</code> in markdown.</p>
        <h2 id="Beta">Beta</h2><p>Done.</p>"##,
    );
    let (doc, diagnostics) = convert_document(&dom, "master", &ConvertConfig::default()).unwrap();

    assert_eq!(
        doc.sections[0].text,
        "## Alpha\n\nWrite `[text](#Beta)` and `[x](#Nope)` in markdown.\n"
    );
    assert!(diagnostics.is_empty());
}
