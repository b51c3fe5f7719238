//! Ingestion State Machine Tests
//!
//! Drives `IngestHandler` with synthetic multipart lifecycle events and
//! inspects the resulting journals on disk.
//!
//! *Note: the HTTP adapter is a thin event bridge; it is exercised by
//! integration tests against a running server.*

#[cfg(test)]
mod tests {
    use crate::error::IngestError;
    use crate::ingest::{IngestHandler, IngestPhase, PartDisposition, RESPONSE_BODY};
    use crate::journal::{Journal, JournalFactory, Value};
    use crate::schema::ColumnType;
    use std::sync::Arc;
    use tempfile::TempDir;

    const CSV_WITH_HEADER: &[u8] = b"name,age,active\nalice,30,true\nbob,25,false\n";

    fn upload(
        factory: &Arc<JournalFactory>,
        filename: &str,
        chunks: &[&[u8]],
    ) -> Result<&'static str, IngestError> {
        let mut handler = IngestHandler::new(factory.clone());
        handler.on_part_begin(&PartDisposition::new("data", Some(filename.to_string())))?;
        for chunk in chunks {
            handler.on_data(chunk)?;
        }
        handler.on_part_end()?;
        Ok(handler.on_complete())
    }

    // ============================================================
    // SCENARIOS
    // ============================================================

    #[test]
    fn test_csv_with_header() {
        let dir = TempDir::new().unwrap();
        let factory = Arc::new(JournalFactory::new(dir.path()));

        let body = upload(&factory, "people.csv", &[CSV_WITH_HEADER]).unwrap();
        assert_eq!(body, RESPONSE_BODY);

        let journal = Journal::open(dir.path(), "people.csv").unwrap();
        assert_eq!(journal.row_count(), 2);

        let schema = journal.schema();
        assert_eq!(schema.columns[0].name.as_deref(), Some("name"));
        assert_eq!(schema.columns[0].column_type, ColumnType::String);
        assert_eq!(schema.columns[1].column_type, ColumnType::Long);
        assert_eq!(schema.columns[2].column_type, ColumnType::Boolean);

        assert_eq!(
            journal.read_column(0).unwrap(),
            vec![Value::Str("alice".into()), Value::Str("bob".into())]
        );
        assert_eq!(
            journal.read_column(1).unwrap(),
            vec![Value::Long(30), Value::Long(25)]
        );
        assert_eq!(
            journal.read_column(2).unwrap(),
            vec![Value::Boolean(true), Value::Boolean(false)]
        );
    }

    #[test]
    fn test_tab_without_header() {
        let dir = TempDir::new().unwrap();
        let factory = Arc::new(JournalFactory::new(dir.path()));

        upload(
            &factory,
            "series.tsv",
            &[b"1\t2.5\t2020-01-01\n3\t4.5\t2020-01-02\n"],
        )
        .unwrap();

        let journal = Journal::open(dir.path(), "series.tsv").unwrap();
        assert_eq!(journal.row_count(), 2);

        let schema = journal.schema();
        assert_eq!(schema.columns[0].label(), "c0");
        assert_eq!(schema.columns[0].column_type, ColumnType::Long);
        assert_eq!(schema.columns[1].column_type, ColumnType::Double);
        assert_eq!(schema.columns[2].column_type, ColumnType::Date);

        assert_eq!(
            journal.read_column(0).unwrap(),
            vec![Value::Long(1), Value::Long(3)]
        );
        // 2020-01-01 midnight UTC.
        assert_eq!(
            journal.read_column(2).unwrap()[0],
            Value::Date(1_577_836_800_000)
        );
    }

    #[test]
    fn test_chunk_boundary_independence() {
        // Any split whose first chunk still carries two complete lines
        // (enough for dialect detection and a representative sample) must
        // produce the same journal as the single-chunk upload.
        let dir = TempDir::new().unwrap();
        let factory = Arc::new(JournalFactory::new(dir.path()));

        upload(&factory, "ref.csv", &[CSV_WITH_HEADER]).unwrap();
        let reference = Journal::open(dir.path(), "ref.csv").unwrap();
        let reference_names: Vec<_> = reference.read_column(0).unwrap();

        let second_newline = CSV_WITH_HEADER
            .iter()
            .enumerate()
            .filter(|&(_, &b)| b == b'\n')
            .map(|(i, _)| i)
            .nth(1)
            .unwrap();

        // Two-chunk splits at every offset inside the final row.
        for split in second_newline + 1..CSV_WITH_HEADER.len() {
            let name = format!("split_{}.csv", split);
            upload(
                &factory,
                &name,
                &[&CSV_WITH_HEADER[..split], &CSV_WITH_HEADER[split..]],
            )
            .unwrap();

            let journal = Journal::open(dir.path(), &name).unwrap();
            assert_eq!(journal.row_count(), 2, "split at {}", split);
            assert_eq!(journal.schema(), reference.schema(), "split at {}", split);
            assert_eq!(
                journal.read_column(0).unwrap(),
                reference_names,
                "split at {}",
                split
            );
        }

        // A three-chunk delivery splitting inside `bob,25` and `false\n`.
        let a = second_newline + 4;
        let b = CSV_WITH_HEADER.len() - 3;
        upload(
            &factory,
            "three.csv",
            &[
                &CSV_WITH_HEADER[..a],
                &CSV_WITH_HEADER[a..b],
                &CSV_WITH_HEADER[b..],
            ],
        )
        .unwrap();
        let journal = Journal::open(dir.path(), "three.csv").unwrap();
        assert_eq!(journal.row_count(), 2);
        assert_eq!(journal.schema(), reference.schema());
    }

    #[test]
    fn test_tiny_first_chunk_skips_the_part() {
        // The sampling prefix is whatever the first chunk delivers. A
        // first chunk without two complete lines fails dialect detection,
        // so the part is discarded while the upload still succeeds.
        let dir = TempDir::new().unwrap();
        let factory = Arc::new(JournalFactory::new(dir.path()));

        let body = upload(
            &factory,
            "tiny.csv",
            &[&CSV_WITH_HEADER[..20], &CSV_WITH_HEADER[20..]],
        )
        .unwrap();
        assert_eq!(body, RESPONSE_BODY);
        assert!(!dir.path().join("tiny.csv").exists());
    }

    #[test]
    fn test_unrecognised_field_aborts() {
        let dir = TempDir::new().unwrap();
        let factory = Arc::new(JournalFactory::new(dir.path()));

        let mut handler = IngestHandler::new(factory);
        let err = handler
            .on_part_begin(&PartDisposition::new(
                "other",
                Some("file.csv".to_string()),
            ))
            .err()
            .expect("field must be rejected");
        assert!(matches!(err, IngestError::UnrecognisedField));
        assert_eq!(handler.phase(), IngestPhase::Aborted);
        assert!(!dir.path().join("file.csv").exists());
    }

    #[test]
    fn test_part_without_filename_is_ignored() {
        let dir = TempDir::new().unwrap();
        let factory = Arc::new(JournalFactory::new(dir.path()));

        let mut handler = IngestHandler::new(factory);
        handler
            .on_part_begin(&PartDisposition::new("meta", None))
            .unwrap();
        handler.on_data(b"ignored bytes").unwrap();
        handler.on_part_end().unwrap();
        assert_eq!(handler.on_complete(), RESPONSE_BODY);
    }

    #[test]
    fn test_undetectable_format_still_succeeds() {
        // 200 lines of structureless noise: no journal, but the upload is
        // syntactically valid and answers OK.
        let dir = TempDir::new().unwrap();
        let factory = Arc::new(JournalFactory::new(dir.path()));

        let mut noise = Vec::new();
        for i in 0..200usize {
            noise.extend(std::iter::repeat_n(b'x', 1 + (i * 7) % 23));
            noise.push(b'\n');
        }

        let body = upload(&factory, "noise.bin", &[&noise]).unwrap();
        assert_eq!(body, RESPONSE_BODY);
        assert!(!dir.path().join("noise.bin").exists());
    }

    #[test]
    fn test_quoted_commas_preserved() {
        let dir = TempDir::new().unwrap();
        let factory = Arc::new(JournalFactory::new(dir.path()));

        upload(&factory, "q.csv", &[b"a,b\n\"x,y\",1\n\"z\",2\n"]).unwrap();

        let journal = Journal::open(dir.path(), "q.csv").unwrap();
        assert_eq!(journal.row_count(), 2);
        assert_eq!(
            journal.read_column(0).unwrap(),
            vec![Value::Str("x,y".into()), Value::Str("z".into())]
        );
    }

    #[test]
    fn test_bad_filename_rejected() {
        let dir = TempDir::new().unwrap();
        let factory = Arc::new(JournalFactory::new(dir.path()));

        let err = upload(&factory, "../escape", &[CSV_WITH_HEADER])
            .err()
            .expect("path-like name must be rejected");
        assert!(matches!(err, IngestError::BadJournalName(_)));
    }

    #[test]
    fn test_schema_clash_with_existing_journal() {
        let dir = TempDir::new().unwrap();
        let factory = Arc::new(JournalFactory::new(dir.path()));

        upload(&factory, "t.csv", &[b"1,2\n3,4\n"]).unwrap();

        // Same journal, now with string cells in a LONG column.
        let mut handler = IngestHandler::new(factory);
        handler
            .on_part_begin(&PartDisposition::new("data", Some("t.csv".to_string())))
            .unwrap();
        let err = handler
            .on_data(b"x,y\nw,z\nq,r\n")
            .err()
            .expect("schema clash must abort the upload");
        assert!(matches!(err, IngestError::SchemaIncompatible { .. }));
        assert_eq!(handler.phase(), IngestPhase::Aborted);
    }

    #[test]
    fn test_teardown_releases_without_commit() {
        let dir = TempDir::new().unwrap();
        let factory = Arc::new(JournalFactory::new(dir.path()));

        let mut handler = IngestHandler::new(factory);
        handler
            .on_part_begin(&PartDisposition::new("data", Some("torn.csv".to_string())))
            .unwrap();
        handler.on_data(CSV_WITH_HEADER).unwrap();
        handler.on_teardown("client disconnected");
        assert_eq!(handler.phase(), IngestPhase::Aborted);

        // The journal exists (metadata was committed at creation) but no
        // rows were made durable.
        let journal = Journal::open(dir.path(), "torn.csv").unwrap();
        assert_eq!(journal.row_count(), 0);
    }

    #[test]
    fn test_sequential_uploads_append() {
        let dir = TempDir::new().unwrap();
        let factory = Arc::new(JournalFactory::new(dir.path()));

        upload(&factory, "acc.csv", &[b"1,2\n3,4\n"]).unwrap();
        upload(&factory, "acc.csv", &[b"5,6\n7,8\n"]).unwrap();

        let journal = Journal::open(dir.path(), "acc.csv").unwrap();
        assert_eq!(journal.row_count(), 4);
        assert_eq!(
            journal.read_column(0).unwrap(),
            vec![
                Value::Long(1),
                Value::Long(3),
                Value::Long(5),
                Value::Long(7)
            ]
        );
    }
}
