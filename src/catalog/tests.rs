use super::*;
use crate::entry::EntryStatus;

const SAMPLE_PO: &str = r#"# French translation.
msgid ""
msgstr ""
"Project-Id-Version: demo 1.0\n"
"Language: fr\n"
"Content-Type: text/plain; charset=UTF-8\n"
"Plural-Forms: nplurals=2; plural=(n > 1);\n"

#. Greeting on the start page
#: src/main.c:12 src/main.c:40
#, c-format
msgid "Hello %s"
msgstr "Bonjour %s"

#: src/menu.c:3
msgctxt "menu"
msgid "Open"
msgstr "Ouvrir"

msgid "Open"
msgstr ""

#, fuzzy
msgid "Bye"
msgstr "Au revoir"

msgid "%d file"
msgid_plural "%d files"
msgstr[0] "%d fichier"
msgstr[1] "%d fichiers"

#~ msgid "Old text"
#~ msgstr "Vieux texte"
"#;

/// 创建测试用的 Catalog
fn create_test_catalog() -> Catalog {
    Catalog::parse(PathBuf::from("/tmp/fr.po"), SAMPLE_PO).unwrap()
}

#[test]
fn test_parse_headers() {
    let catalog = create_test_catalog();

    assert_eq!(catalog.language(), Some("fr"));
    assert_eq!(catalog.plural_forms(), Some("nplurals=2; plural=(n > 1);"));
    assert_eq!(catalog.headers.get_index(0).unwrap().0, "Project-Id-Version");
}

#[test]
fn test_parse_entry_metadata() {
    let catalog = create_test_catalog();
    assert_eq!(catalog.entries.len(), 6);

    let hello = &catalog.entries[0];
    assert_eq!(hello.id, "Hello %s");
    assert_eq!(hello.comments, vec!["Greeting on the start page".to_string()]);
    assert_eq!(hello.references, vec!["src/main.c:12", "src/main.c:40"]);
    assert!(hello.flags.contains("c-format"));
    assert_eq!(hello.status(), EntryStatus::Translated);
}

#[test]
fn test_parse_plural_and_obsolete() {
    let catalog = create_test_catalog();

    let plural = catalog.find_entry("%d file", None).unwrap();
    assert_eq!(plural.plural_id.as_deref(), Some("%d files"));
    assert_eq!(
        plural.translation,
        Translation::Plural(vec!["%d fichier".into(), "%d fichiers".into()])
    );

    let obsolete = catalog.entries.last().unwrap();
    assert!(obsolete.obsolete);
    assert_eq!(obsolete.id, "Old text");
    assert_eq!(obsolete.translation.primary(), "Vieux texte");
    assert!(catalog.find_entry("Old text", None).is_none());
}

#[test]
fn test_find_entry_context_is_exact() {
    let catalog = create_test_catalog();

    assert_eq!(catalog.find_entry("Open", Some("menu")).unwrap().translation.primary(), "Ouvrir");
    assert_eq!(catalog.find_entry("Open", None).unwrap().translation.primary(), "");
    assert!(catalog.find_entry("Open", Some("")).is_none());
}

#[test]
fn test_update_translation_clears_fuzzy() {
    let mut catalog = create_test_catalog();

    let previous = catalog
        .update_translation("Bye", None, Translation::Singular("Salut".into()))
        .unwrap();
    assert_eq!(previous, Translation::Singular("Au revoir".into()));

    let bye = catalog.find_entry("Bye", None).unwrap();
    assert_eq!(bye.translation.primary(), "Salut");
    assert!(!bye.is_fuzzy());
}

#[test]
fn test_update_translation_respects_context() {
    let mut catalog = create_test_catalog();

    catalog
        .update_translation("Open", None, Translation::Singular("Ouvrir le fichier".into()))
        .unwrap();

    assert_eq!(catalog.find_entry("Open", Some("menu")).unwrap().translation.primary(), "Ouvrir");
    assert_eq!(
        catalog.find_entry("Open", None).unwrap().translation.primary(),
        "Ouvrir le fichier"
    );
}

#[test]
fn test_update_translation_not_found() {
    let mut catalog = create_test_catalog();
    let before = catalog.entries.clone();

    let result = catalog.update_translation("Missing", None, Translation::Singular("x".into()));
    assert!(matches!(result, Err(CatalogError::TranslationNotFound { .. })));

    // 废弃条目不可更新
    let result = catalog.update_translation("Old text", None, Translation::Singular("x".into()));
    assert!(result.is_err());
    assert_eq!(catalog.entries, before);
}

#[test]
fn test_stats() {
    let catalog = create_test_catalog();
    let stats = catalog.stats();

    assert_eq!(
        stats,
        CatalogStats {
            total: 6,
            translated: 3,
            untranslated: 1,
            fuzzy: 1,
            obsolete: 1,
        }
    );
    assert!((stats.completion_percentage() - 60.0).abs() < 1e-9);
    assert!(stats.to_string().contains("已废弃: 1"));
}

#[test]
fn test_stats_fuzzy_not_double_counted() {
    let catalog = Catalog::parse(
        PathBuf::from("/tmp/x.po"),
        "msgid \"Hello\"\nmsgstr \"\"\n\n#, fuzzy\nmsgid \"Bye\"\nmsgstr \"Au revoir\"\n",
    )
    .unwrap();

    assert_eq!(
        catalog.stats(),
        CatalogStats {
            total: 2,
            translated: 0,
            untranslated: 1,
            fuzzy: 1,
            obsolete: 0,
        }
    );
}

#[test]
fn test_decode_latin1_catalog() {
    let mut bytes = b"msgid \"\"\nmsgstr \"\"\n\"Content-Type: text/plain; charset=ISO-8859-1\\n\"\n\nmsgid \"Coffee\"\nmsgstr \"Caf".to_vec();
    bytes.push(0xE9);
    bytes.extend_from_slice(b"\"\n");

    let catalog = Catalog::from_bytes(PathBuf::from("/tmp/l1.po"), &bytes, Local::now()).unwrap();
    assert_ne!(catalog.encoding(), UTF_8);
    assert_eq!(catalog.find_entry("Coffee", None).unwrap().translation.primary(), "Café");

    let (text, encoding) = decode_catalog_bytes(Path::new("/tmp/l1.po"), &bytes).unwrap();
    let encoded = encode_catalog_text(Path::new("/tmp/l1.po"), text, encoding).unwrap();
    assert_eq!(encoded, bytes);
}

#[test]
fn test_decode_ascii_catalog_keeps_declared_charset() {
    let bytes = b"msgid \"\"\nmsgstr \"\"\n\"Content-Type: text/plain; charset=ISO-8859-1\\n\"\n\nmsgid \"Coffee\"\nmsgstr \"\"\n";

    let (text, encoding) = decode_catalog_bytes(Path::new("/tmp/ascii.po"), bytes).unwrap();
    assert_ne!(encoding, UTF_8);

    let encoded = encode_catalog_text(
        Path::new("/tmp/ascii.po"),
        text.replacen("msgid \"Coffee\"\nmsgstr \"\"", "msgid \"Coffee\"\nmsgstr \"Café\"", 1),
        encoding,
    )
    .unwrap();
    assert!(encoded.ends_with(b"msgstr \"Caf\xE9\"\n"));
}

#[test]
fn test_decode_unknown_charset_falls_back_to_utf8() {
    let bytes = "msgid \"\"\nmsgstr \"\"\n\"Content-Type: text/plain; charset=CHARSET\\n\"\n\nmsgid \"Thé\"\nmsgstr \"\"\n";
    let (text, encoding) = decode_catalog_bytes(Path::new("/tmp/t.pot"), bytes.as_bytes()).unwrap();
    assert_eq!(encoding, UTF_8);
    assert_eq!(text, bytes);
}

#[test]
fn test_decode_invalid_utf8_without_charset() {
    let bytes = [b'm', b's', b'g', 0xFF, b'\n'];
    let result = decode_catalog_bytes(Path::new("/tmp/bad.po"), &bytes);
    assert!(matches!(result, Err(CatalogError::ParseError { .. })));
}

#[test]
fn test_encode_unrepresentable_character() {
    let result = encode_catalog_text(
        Path::new("/tmp/l1.po"),
        "日本".to_string(),
        encoding_rs::WINDOWS_1252,
    );
    assert!(matches!(result, Err(CatalogError::PersistenceError { .. })));
}
