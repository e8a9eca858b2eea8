//! Message-studio file round-trips: header fields, block ordering,
//! 16-byte `0xAB` block padding, and every block codec.

use lms_core::blocks::{
    AttrInfo, AttrInfoBlock, ColorsBlock, ControlTag, HashTableBlock, ItemListsBlock, Message,
    NameListBlock, OpaqueBlock, Rgba, SourceFilesBlock, StyleRecord, StylesBlock, TagIndexBlock,
    TagIndexEntry, TagParam, TagParamsBlock, TextBlock, PLACEHOLDER,
};
use lms_core::{Block, BlockCtx, BlockTag, ByteOrder, Error, MsfFile, MsfKind, TextEncoding};

// ── helpers ────────────────────────────────────────────────────────────────

fn le_ctx() -> BlockCtx {
    BlockCtx {
        order: ByteOrder::Little,
        encoding: TextEncoding::Utf16,
    }
}

fn utf8_ctx() -> BlockCtx {
    BlockCtx {
        order: ByteOrder::Little,
        encoding: TextEncoding::Utf8,
    }
}

fn u16_at(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn u32_at(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn sample_standard() -> MsfFile {
    let mut file = MsfFile::new(MsfKind::Standard, ByteOrder::Little, TextEncoding::Utf16);

    let mut labels = HashTableBlock::new(101);
    labels.insert("Msg_Hello", 0);
    labels.insert("Msg_Bye", 1);
    file.push_block(BlockTag::LBL1, Block::Labels(labels));

    file.push_block(
        BlockTag::ATR1,
        Block::Opaque(OpaqueBlock {
            data: vec![0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
        }),
    );

    file.push_block(
        BlockTag::TXT2,
        Block::Text(TextBlock {
            messages: vec![
                Message::plain("Hello, world.\n"),
                Message {
                    text: format!("Bye {PLACEHOLDER}"),
                    tags: vec![ControlTag::Tag {
                        group: 0,
                        tag: 3,
                        params: vec![0x00, 0x00, 0x00, 0xFF],
                    }],
                },
            ],
        }),
    );
    file
}

fn sample_project() -> MsfFile {
    let mut file = MsfFile::new(MsfKind::Project, ByteOrder::Little, TextEncoding::Utf16);
    file.push_block(
        BlockTag::CLR1,
        Block::Colors(ColorsBlock {
            colors: vec![
                Rgba { r: 255, g: 255, b: 255, a: 255 },
                Rgba { r: 0x20, g: 0x40, b: 0x60, a: 0x80 },
            ],
        }),
    );
    let mut clb1 = HashTableBlock::new(29);
    clb1.insert("White", 0);
    clb1.insert("Accent", 1);
    file.push_block(BlockTag::CLB1, Block::Labels(clb1));
    file.push_block(
        BlockTag::ATI2,
        Block::AttrInfo(AttrInfoBlock {
            attributes: vec![
                AttrInfo { kind: 9, unk: 0, list_index: 0, offset: 0 },
                AttrInfo { kind: 1, unk: 0, list_index: 0, offset: 4 },
            ],
        }),
    );
    let mut alb1 = HashTableBlock::new(29);
    alb1.insert("Voice", 0);
    file.push_block(BlockTag::ALB1, Block::Labels(alb1));
    file.push_block(
        BlockTag::ALI2,
        Block::ItemLists(ItemListsBlock {
            lists: vec![vec!["on".into(), "off".into()], Vec::new()],
        }),
    );
    file.push_block(
        BlockTag::TGG2,
        Block::TagGroups(TagIndexBlock {
            entries: vec![TagIndexEntry { name: "system".into(), indices: vec![0, 1] }],
        }),
    );
    file.push_block(
        BlockTag::TAG2,
        Block::Tags(TagIndexBlock {
            entries: vec![
                TagIndexEntry { name: "Ruby".into(), indices: vec![0] },
                TagIndexEntry { name: "Font".into(), indices: vec![1] },
            ],
        }),
    );
    file.push_block(
        BlockTag::TGP2,
        Block::TagParams(TagParamsBlock {
            parameters: vec![
                TagParam { name: "rt".into(), kind: 8, items: Vec::new() },
                TagParam { name: "face".into(), kind: 9, items: vec![0, 1] },
            ],
        }),
    );
    file.push_block(
        BlockTag::TGL2,
        Block::TagList(NameListBlock {
            names: vec!["serif".into(), "sans".into()],
        }),
    );
    file.push_block(
        BlockTag::SYL3,
        Block::Styles(StylesBlock {
            styles: vec![StyleRecord {
                region_width: 400,
                line_count: 2,
                font_index: 0,
                base_color: -1,
            }],
        }),
    );
    let mut slb1 = HashTableBlock::new(29);
    slb1.insert("Default", 0);
    file.push_block(BlockTag::SLB1, Block::Labels(slb1));
    file.push_block(
        BlockTag::CTI1,
        Block::Sources(SourceFilesBlock {
            filenames: vec!["source/Game.msmt".into()],
        }),
    );
    file
}

// ── tests ──────────────────────────────────────────────────────────────────

#[test]
fn standard_roundtrip() {
    let file = sample_standard();
    let bytes = file.to_bytes();

    let parsed = MsfFile::parse(&bytes).unwrap();
    assert_eq!(parsed, file);
    assert_eq!(parsed.to_bytes(), bytes);
}

#[test]
fn project_roundtrip() {
    let file = sample_project();
    let bytes = file.to_bytes();

    let parsed = MsfFile::parse(&bytes).unwrap();
    assert_eq!(parsed.kind(), MsfKind::Project);
    assert_eq!(parsed, file);
    assert_eq!(parsed.to_bytes(), bytes);
}

#[test]
fn flow_roundtrip() {
    let mut file = MsfFile::new(MsfKind::Flow, ByteOrder::Little, TextEncoding::Utf16);
    file.push_block(
        BlockTag::FLW3,
        Block::Opaque(OpaqueBlock {
            data: vec![0xDE, 0xAD, 0xBE, 0xEF, 0x01],
        }),
    );
    let mut fen1 = HashTableBlock::new(19);
    fen1.insert("Entry_Start", 0);
    file.push_block(BlockTag::FEN1, Block::Labels(fen1));

    let bytes = file.to_bytes();
    let parsed = MsfFile::parse(&bytes).unwrap();
    assert_eq!(parsed.kind(), MsfKind::Flow);
    assert_eq!(parsed, file);
    assert_eq!(parsed.to_bytes(), bytes);
}

#[test]
fn big_endian_roundtrip() {
    let mut file = MsfFile::new(MsfKind::Standard, ByteOrder::Big, TextEncoding::Utf16);
    let mut labels = HashTableBlock::new(7);
    labels.insert("greeting", 0);
    file.push_block(BlockTag::LBL1, Block::Labels(labels));
    file.push_block(
        BlockTag::TXT2,
        Block::Text(TextBlock {
            messages: vec![Message::plain("Hei")],
        }),
    );

    let bytes = file.to_bytes();
    assert_eq!(&bytes[8..10], [0xFE, 0xFF]);
    let parsed = MsfFile::parse(&bytes).unwrap();
    assert_eq!(parsed.order(), ByteOrder::Big);
    assert_eq!(parsed, file);
    assert_eq!(parsed.to_bytes(), bytes);
}

#[test]
fn utf8_roundtrip() {
    let mut file = MsfFile::new(MsfKind::Project, ByteOrder::Little, TextEncoding::Utf8);
    file.push_block(
        BlockTag::TGL2,
        Block::TagList(NameListBlock {
            names: vec!["héllo".into(), "ascii".into()],
        }),
    );
    let bytes = file.to_bytes();
    let parsed = MsfFile::parse(&bytes).unwrap();
    assert_eq!(parsed.encoding(), TextEncoding::Utf8);
    assert_eq!(parsed, file);
    assert_eq!(parsed.to_bytes(), bytes);
}

#[test]
fn utf32_roundtrip() {
    let mut file = MsfFile::new(MsfKind::Standard, ByteOrder::Little, TextEncoding::Utf32);
    let mut labels = HashTableBlock::new(7);
    labels.insert("farewell", 0);
    file.push_block(BlockTag::LBL1, Block::Labels(labels));
    file.push_block(
        BlockTag::TXT2,
        Block::Text(TextBlock {
            messages: vec![Message {
                text: format!("bye 🎮{PLACEHOLDER}"),
                tags: vec![ControlTag::Tag { group: 1, tag: 2, params: vec![7] }],
            }],
        }),
    );

    let bytes = file.to_bytes();
    assert_eq!(bytes[12], 2);
    let parsed = MsfFile::parse(&bytes).unwrap();
    assert_eq!(parsed.encoding(), TextEncoding::Utf32);
    assert_eq!(parsed, file);
    assert_eq!(parsed.to_bytes(), bytes);
}

#[test]
fn label_reverse_lookup() {
    let mut table = HashTableBlock::new(29);
    table.insert("Msg_A", 0);
    table.insert("Msg_B", 1);
    assert_eq!(table.label_for(1), Some("Msg_B"));
    assert_eq!(table.label_for(5), None);
}

#[test]
fn header_fields() {
    let file = sample_standard();
    let bytes = file.to_bytes();

    assert_eq!(&bytes[0..8], b"MsgStdBn");
    assert_eq!(&bytes[8..10], [0xFF, 0xFE]);
    assert_eq!(bytes[12], 1); // utf-16
    assert_eq!(bytes[13], 3); // version
    assert_eq!(u16_at(&bytes, 14), 3); // block count
    assert_eq!(u32_at(&bytes, 18), bytes.len() as u32);
}

#[test]
fn blocks_keep_insertion_order() {
    let parsed = MsfFile::parse(&sample_standard().to_bytes()).unwrap();
    let tags: Vec<BlockTag> = parsed.blocks().iter().map(|(t, _)| *t).collect();
    assert_eq!(tags, [BlockTag::LBL1, BlockTag::ATR1, BlockTag::TXT2]);
}

#[test]
fn block_bodies_align_to_16_with_ab_fill() {
    let bytes = sample_standard().to_bytes();

    let mut pos = 32;
    let mut seen = 0;
    while seen < 3 {
        assert_eq!(pos % 16, 0, "block header at {pos}");
        let size = u32_at(&bytes, pos + 4) as usize;
        // 16-byte block header, then the body.
        let body = pos + 16;
        assert_eq!(body % 16, 0);
        let end = body + size;
        let aligned = end.div_ceil(16) * 16;
        for (i, &b) in bytes[end..aligned.min(bytes.len())].iter().enumerate() {
            assert_eq!(b, 0xAB, "fill byte at {}", end + i);
        }
        pos = aligned;
        seen += 1;
    }
    assert_eq!(pos, bytes.len());
}

#[test]
fn parser_accepts_any_fill_bytes() {
    let mut bytes = sample_standard().to_bytes();
    let reference = MsfFile::parse(&bytes).unwrap();
    // Scribble over every 0xAB pad byte.
    for b in bytes.iter_mut() {
        if *b == 0xAB {
            *b = 0x5C;
        }
    }
    // ATR1 opaque bytes contain no 0xAB, so only padding changed.
    let parsed = MsfFile::parse(&bytes).unwrap();
    assert_eq!(parsed, reference);
}

#[test]
fn txt2_control_record_layout() {
    let body = vec![
        0x01, 0x00, 0x00, 0x00, // one message
        0x08, 0x00, 0x00, 0x00, // at offset 8 from the body start
        0x0E, 0x00, // control marker
        0x00, 0x00, // group 0
        0x03, 0x00, // tag 3
        0x04, 0x00, // four parameter bytes
        0x00, 0x00, 0x00, 0xFF, // parameters
        0x00, 0x00, // terminator
    ];
    let block = TextBlock::from_bytes(&body, &le_ctx()).unwrap();
    assert_eq!(block.messages.len(), 1);
    assert_eq!(block.messages[0].text, PLACEHOLDER.to_string());
    assert_eq!(
        block.messages[0].tags,
        [ControlTag::Tag {
            group: 0,
            tag: 3,
            params: vec![0x00, 0x00, 0x00, 0xFF],
        }]
    );
    assert_eq!(block.to_bytes(&le_ctx()), body);
}

#[test]
fn txt2_button_shorthand() {
    let body = vec![
        0x01, 0x00, 0x00, 0x00, //
        0x08, 0x00, 0x00, 0x00, //
        0x48, 0x00, // 'H'
        0xE0, 0x04, // button label 4
        0x00, 0x00, // terminator
    ];
    let block = TextBlock::from_bytes(&body, &le_ctx()).unwrap();
    assert_eq!(block.messages[0].text, format!("H{PLACEHOLDER}"));
    assert_eq!(block.messages[0].tags, [ControlTag::Button(4)]);
    assert_eq!(block.to_bytes(&le_ctx()), body);
}

#[test]
fn txt2_multiple_messages_offsets() {
    let block = TextBlock {
        messages: vec![Message::plain("ab"), Message::plain("c")],
    };
    let bytes = block.to_bytes(&le_ctx());
    // Offset table: 4 + 8 = 12 bytes of header, then "ab\0" (6 bytes).
    assert_eq!(u32_at(&bytes, 0), 2);
    assert_eq!(u32_at(&bytes, 4), 12);
    assert_eq!(u32_at(&bytes, 8), 18);
    assert_eq!(TextBlock::from_bytes(&bytes, &le_ctx()).unwrap(), block);
}

#[test]
fn txt2_surrogate_pair_text() {
    let block = TextBlock {
        messages: vec![Message::plain("🎮 go")],
    };
    let bytes = block.to_bytes(&le_ctx());
    assert_eq!(TextBlock::from_bytes(&bytes, &le_ctx()).unwrap(), block);
}

#[test]
fn hash_function_is_stable() {
    assert_eq!(HashTableBlock::hash("MSBT_Test", 29), 10);
    assert_eq!(HashTableBlock::hash("Msg_Hello", 101), 98);
    assert_eq!(HashTableBlock::hash("Msg_Bye", 101), 24);
}

#[test]
fn hash_table_buckets_by_label_hash() {
    let mut table = HashTableBlock::new(101);
    table.insert("Msg_Hello", 7);
    table.insert("Msg_Bye", 9);
    let bytes = table.to_bytes(&le_ctx());

    assert_eq!(u32_at(&bytes, 0), 101);
    // Slot table entry for Msg_Hello (slot 98): one label at `offset`.
    let slot = 4 + 8 * 98;
    assert_eq!(u32_at(&bytes, slot), 1);
    let offset = u32_at(&bytes, slot + 4) as usize;
    assert_eq!(bytes[offset] as usize, "Msg_Hello".len());
    assert_eq!(&bytes[offset + 1..offset + 10], b"Msg_Hello");
    assert_eq!(u32_at(&bytes, offset + 10), 7);

    let parsed = HashTableBlock::from_bytes(&bytes, &le_ctx()).unwrap();
    assert_eq!(parsed, table);
    assert_eq!(parsed.slot_count(), 101);
    assert_eq!(parsed.get("Msg_Hello"), Some(7));
    assert_eq!(parsed.get("Msg_Bye"), Some(9));
    assert_eq!(parsed.get("Msg_Missing"), None);
    assert_eq!(parsed.to_bytes(&le_ctx()), bytes);
}

#[test]
fn hash_table_insert_replaces() {
    let mut table = HashTableBlock::new(5);
    table.insert("Test_A", 1);
    table.insert("Test_A", 2);
    assert_eq!(table.len(), 1);
    assert_eq!(table.get("Test_A"), Some(2));
}

#[test]
fn tgl2_bodies_are_unpadded() {
    let block = NameListBlock {
        names: vec!["a".into()],
    };
    let bytes = block.to_bytes(&utf8_ctx());
    assert_eq!(
        bytes,
        [0x01, 0x00, 0x00, 0x00, 0x08, 0x00, 0x00, 0x00, b'a', 0x00]
    );
}

#[test]
fn cti1_uses_u32_count() {
    let block = SourceFilesBlock {
        filenames: vec!["a.txt".into()],
    };
    let bytes = block.to_bytes(&utf8_ctx());
    assert_eq!(u32_at(&bytes, 0), 1);
    assert_eq!(u32_at(&bytes, 4), 8);
    assert_eq!(&bytes[8..], b"a.txt\0");
    assert_eq!(
        SourceFilesBlock::from_bytes(&bytes, &utf8_ctx()).unwrap(),
        block
    );
}

#[test]
fn tgg2_records_pad_to_u32() {
    let block = TagIndexBlock {
        entries: vec![
            TagIndexEntry { name: "a".into(), indices: vec![3] },
            TagIndexEntry { name: "bb".into(), indices: Vec::new() },
        ],
    };
    let bytes = block.to_bytes(&utf8_ctx());
    // Header 4 + table 8; record 0 at 12: count(2) + index(2) + "a\0"
    // = 6 bytes, padded to 8.
    assert_eq!(u32_at(&bytes, 4), 12);
    assert_eq!(u32_at(&bytes, 8), 20);
    assert_eq!(&bytes[12..20], [0x01, 0x00, 0x03, 0x00, b'a', 0x00, 0x00, 0x00]);
    assert_eq!(TagIndexBlock::from_bytes(&bytes, &utf8_ctx()).unwrap(), block);
}

#[test]
fn tgp2_enumeration_record_layout() {
    let block = TagParamsBlock {
        parameters: vec![TagParam { name: "face".into(), kind: 9, items: vec![0, 1] }],
    };
    let bytes = block.to_bytes(&utf8_ctx());
    // Record at 8: type, pad, item count, two items, name, pad to 4.
    assert_eq!(u32_at(&bytes, 4), 8);
    assert_eq!(
        &bytes[8..],
        [9, 0x00, 0x02, 0x00, 0x00, 0x00, 0x01, 0x00, b'f', b'a', b'c', b'e', 0x00, 0x00, 0x00, 0x00]
    );
    assert_eq!(TagParamsBlock::from_bytes(&bytes, &utf8_ctx()).unwrap(), block);
}

#[test]
fn clr1_fixed_records() {
    let block = ColorsBlock {
        colors: vec![Rgba { r: 1, g: 2, b: 3, a: 4 }],
    };
    assert_eq!(
        block.to_bytes(&le_ctx()),
        [0x01, 0x00, 0x00, 0x00, 1, 2, 3, 4]
    );

    let be = BlockCtx {
        order: ByteOrder::Big,
        encoding: TextEncoding::Utf16,
    };
    assert_eq!(block.to_bytes(&be), [0x00, 0x00, 0x00, 0x01, 1, 2, 3, 4]);
    assert_eq!(ColorsBlock::from_bytes(&block.to_bytes(&be), &be).unwrap(), block);
}

#[test]
fn syl3_signed_color_field() {
    let block = StylesBlock {
        styles: vec![StyleRecord {
            region_width: 1,
            line_count: 2,
            font_index: 3,
            base_color: -1,
        }],
    };
    let bytes = block.to_bytes(&le_ctx());
    assert_eq!(&bytes[16..20], [0xFF, 0xFF, 0xFF, 0xFF]);
    assert_eq!(StylesBlock::from_bytes(&bytes, &le_ctx()).unwrap(), block);
}

#[test]
fn ali2_nested_lists_roundtrip() {
    let block = ItemListsBlock {
        lists: vec![
            vec!["x".into(), "yy".into()],
            Vec::new(),
            vec!["end".into()],
        ],
    };
    let bytes = block.to_bytes(&le_ctx());
    let parsed = ItemListsBlock::from_bytes(&bytes, &le_ctx()).unwrap();
    assert_eq!(parsed, block);
    assert_eq!(parsed.to_bytes(&le_ctx()), bytes);
}

#[test]
fn atr1_is_preserved_verbatim() {
    let raw: Vec<u8> = (0..=255).collect();
    let mut file = MsfFile::new(MsfKind::Standard, ByteOrder::Little, TextEncoding::Utf16);
    file.push_block(BlockTag::ATR1, Block::Opaque(OpaqueBlock { data: raw.clone() }));
    let parsed = MsfFile::parse(&file.to_bytes()).unwrap();
    match parsed.block(BlockTag::ATR1) {
        Some(Block::Opaque(b)) => assert_eq!(b.data, raw),
        other => panic!("expected opaque ATR1, got {other:?}"),
    }
}

#[test]
fn parse_rejects_bad_magic() {
    let err = MsfFile::parse(b"MsgXxxBn\xFF\xFE\x00\x00\x01\x03\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00").unwrap_err();
    assert!(matches!(err, Error::BadMagic { .. }));
}

#[test]
fn parse_rejects_bad_bom() {
    let err = MsfFile::parse(b"MsgStdBn\x00\x00\x00\x00\x01\x03\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00").unwrap_err();
    assert!(matches!(err, Error::BadBom(_)));
}

#[test]
fn parse_rejects_bad_version() {
    let mut bytes = sample_standard().to_bytes();
    bytes[13] = 4;
    let err = MsfFile::parse(&bytes).unwrap_err();
    assert!(matches!(err, Error::BadVersion(4)));
}

#[test]
fn parse_rejects_bad_encoding() {
    let mut bytes = sample_standard().to_bytes();
    bytes[12] = 3;
    let err = MsfFile::parse(&bytes).unwrap_err();
    assert!(matches!(err, Error::BadEncoding(3)));
}

#[test]
fn parse_rejects_unknown_block_tag() {
    // A standard file never carries CLR1; closed dispatch refuses it.
    let mut bytes = sample_standard().to_bytes();
    bytes[32..36].copy_from_slice(b"CLR1");
    let err = MsfFile::parse(&bytes).unwrap_err();
    assert!(matches!(err, Error::UnknownBlockTag(tag) if tag == BlockTag::CLR1));
}

#[test]
fn parse_rejects_truncated_input() {
    let bytes = sample_standard().to_bytes();
    for cut in [0, 7, 9, 16, 31, 40] {
        let err = MsfFile::parse(&bytes[..cut]).unwrap_err();
        assert!(
            matches!(err, Error::Truncated { .. }),
            "cut at {cut}: {err}"
        );
    }
}
