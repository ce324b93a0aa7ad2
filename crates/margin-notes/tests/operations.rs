mod common;

use common::{add_document, add_user, create_test_db, reply, thread};
use margin_notes::{NewNote, Note, NoteError, NoteQueryExt, NoteUser, RelationType};
use margin_orm::{Builder, Model, PivotTable};

#[test]
fn create_links_mentions_and_marks_read() {
    let conn = create_test_db();
    let ada = add_user(&conn, "ada");
    let grace = add_user(&conn, "grace");
    let doc = add_document(&conn, "Roadmap");

    let note = Note::create(
        &conn,
        &NewNote::thread(doc, ada, "  @grace @ada @nobody can you look?  "),
    )
    .unwrap();
    assert_eq!(note.content, "@grace @ada @nobody can you look?");
    assert!(note.is_thread());
    assert_eq!(note.author.as_ref().map(|u| u.id), Some(ada));
    let mentioned: Vec<i64> = note.mentions.iter().map(|m| m.related.id).collect();
    assert_eq!(mentioned, [grace], "authors do not mention themselves");
    assert_eq!(note.mentions.as_slice()[0].pivot.kind, RelationType::Mention);

    let readers = PivotTable::<NoteUser>::new(&conn, note.id, "read").keys().unwrap();
    assert_eq!(readers.into_vec(), [ada]);
}

#[test]
fn replies_take_the_thread_document() {
    let conn = create_test_db();
    let ada = add_user(&conn, "ada");
    let doc = add_document(&conn, "Roadmap");
    let t = thread(&conn, doc, ada, "question");

    let answer = Note::create(&conn, &NewNote::reply(t, ada, "answer")).unwrap();
    assert_eq!(answer.document_id, doc);
    assert_eq!(answer.thread_id(), t);

    let err = Note::create(&conn, &NewNote::reply(answer.id, ada, "nested")).unwrap_err();
    assert!(matches!(err, NoteError::NotAThread(id) if id == answer.id));

    let err = Note::create(&conn, &NewNote::reply(404, ada, "lost")).unwrap_err();
    assert!(matches!(err, NoteError::NotAThread(404)));
}

#[test]
fn blank_content_is_rejected_before_any_query() {
    let conn = create_test_db();
    let err = Note::create(&conn, &NewNote::thread(1, 1, " \n\t")).unwrap_err();
    assert!(matches!(err, NoteError::EmptyContent));
    assert_eq!(conn.count(), 0);
}

#[test]
fn resolve_and_reopen_threads() {
    let conn = create_test_db();
    let ada = add_user(&conn, "ada");
    let doc = add_document(&conn, "Roadmap");
    let t = thread(&conn, doc, ada, "question");
    let r = reply(&conn, t, ada, "answer");

    assert!(Note::resolve(&conn, t).unwrap());
    assert!(!Note::resolve(&conn, t).unwrap(), "already resolved");
    assert!(!Note::resolve(&conn, r).unwrap(), "replies are never resolved");
    assert!(Note::objects(&conn).find(t).unwrap().unwrap().is_resolved);

    assert!(Note::reopen(&conn, t).unwrap());
    assert!(!Note::objects(&conn).find(t).unwrap().unwrap().is_resolved);
}

#[test]
fn trash_and_restore_cover_replies() {
    let conn = create_test_db();
    let ada = add_user(&conn, "ada");
    let doc = add_document(&conn, "Roadmap");
    let t = thread(&conn, doc, ada, "question");
    reply(&conn, t, ada, "answer");

    assert_eq!(Note::trash(&conn, t).unwrap(), 2);
    assert_eq!(Note::objects(&conn).count().unwrap(), 0);
    assert_eq!(Note::objects(&conn).only_trashed().count().unwrap(), 2);
    let trashed = Note::objects(&conn).with_trashed().find(t).unwrap().unwrap();
    assert!(trashed.is_trashed());

    assert_eq!(Note::restore(&conn, t).unwrap(), 2);
    assert_eq!(Note::objects(&conn).count().unwrap(), 2);
    assert_eq!(Note::restore(&conn, t).unwrap(), 0);
}

#[test]
fn delete_thread_removes_notes_and_links() {
    let conn = create_test_db();
    let ada = add_user(&conn, "ada");
    add_user(&conn, "grace");
    let doc = add_document(&conn, "Roadmap");
    let t = thread(&conn, doc, ada, "@grace question");
    let r = reply(&conn, t, ada, "answer");
    let other = thread(&conn, doc, ada, "keep me");
    Note::trash(&conn, r).unwrap();

    assert_eq!(Note::delete_thread(&conn, t).unwrap(), 2);
    assert!(Note::objects(&conn).with_trashed().find(t).unwrap().is_none());
    assert!(Note::objects(&conn).with_trashed().find(r).unwrap().is_none());

    let links = NoteUser::objects(&conn).get().unwrap();
    assert!(links.iter().all(|link| link.note_id == other));
    assert_eq!(Note::delete_thread(&conn, t).unwrap(), 0);
}

#[test]
fn sync_mentions_returns_new_users() {
    let conn = create_test_db();
    let ada = add_user(&conn, "ada");
    let grace = add_user(&conn, "grace");
    let linus = add_user(&conn, "linus");
    let doc = add_document(&conn, "Roadmap");
    let t = thread(&conn, doc, ada, "@grace hi");

    conn.reset();
    let fresh = Note::sync_mentions(&conn, t, [grace, linus]).unwrap();
    assert_eq!(fresh.into_vec(), [linus]);
    // one read of the current keys and one insert
    assert_eq!(conn.count(), 2);

    let fresh = Note::sync_mentions(&conn, t, [linus]).unwrap();
    assert!(fresh.is_empty());
    let note = Note::objects(&conn).with_mentions().find(t).unwrap().unwrap();
    let mentioned: Vec<i64> = note.mentions.iter().map(|m| m.related.id).collect();
    assert_eq!(mentioned, [linus]);
}

#[test]
fn document_filter() {
    let conn = create_test_db();
    let ada = add_user(&conn, "ada");
    let roadmap = add_document(&conn, "Roadmap");
    let notes = add_document(&conn, "Notes");
    let a = thread(&conn, roadmap, ada, "a");
    thread(&conn, notes, ada, "b");

    let found = Note::objects(&conn)
        .threads()
        .for_document(roadmap)
        .with_document()
        .get()
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found.as_slice()[0].id, a);
    assert_eq!(
        found.as_slice()[0].document.as_ref().map(|d| d.title.as_str()),
        Some("Roadmap")
    );
}
