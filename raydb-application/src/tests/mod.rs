pub mod prelude {
    use std::{cell::RefCell, collections::HashMap};

    use anyhow::Result as Fallible;
    pub use raydb_core::{
        db::*,
        entities::*,
        gateways::messenger::*,
        repositories::{Error as RepoError, *},
        tag::TagKeywords,
        usecases,
    };
    use raydb_entities::builders::*;

    pub mod sqlite {
        pub use super::super::super::sqlite::*;
    }

    pub mod tantivy {
        pub use raydb_db_tantivy::SearchEngine;
    }

    pub use crate::{error::AppError, notify::Moderators, prelude as flows};

    /// Keeps every outgoing text for later inspection.
    #[derive(Default)]
    pub struct RecordingMessenger {
        texts: RefCell<Vec<(UserId, String)>>,
    }

    impl RecordingMessenger {
        pub fn sent(&self) -> Vec<(UserId, String)> {
            self.texts.borrow().clone()
        }
    }

    impl Messenger for RecordingMessenger {
        fn send_text(&self, to: UserId, text: &str, _: Option<&Controls>) -> Fallible<MessageId> {
            let mut texts = self.texts.borrow_mut();
            texts.push((to, text.to_string()));
            Ok(MessageId(texts.len() as i64))
        }
        fn send_photos(&self, _: UserId, photos: &[String], _: Option<&str>) -> Fallible<Vec<MessageId>> {
            Ok((0..photos.len()).map(|i| MessageId(i as i64)).collect())
        }
        fn send_location(&self, _: UserId, _: Location) -> Fallible<MessageId> {
            Ok(MessageId(0))
        }
        fn edit_controls(&self, _: UserId, _: MessageId, _: &Controls) -> Fallible<()> {
            Ok(())
        }
        fn delete_message(&self, _: UserId, _: MessageId) -> Fallible<()> {
            Ok(())
        }
    }

    pub struct BackendFixture {
        pub db_connections: sqlite::Connections,
        pub search_engine: RefCell<tantivy::SearchEngine>,
        pub messenger: RecordingMessenger,
        pub tags: TagKeywords,
        /// Configured admin without a stored role.
        pub admin: UserInfo,
        pub moderator: UserInfo,
        pub visitor: UserInfo,
    }

    fn user(id: i64, roles: Vec<Role>) -> UserInfo {
        let mut info = UserInfo::new(UserId::new(id), Some(format!("user{id}")), Timestamp::now());
        info.roles = roles;
        info
    }

    impl BackendFixture {
        pub fn new() -> BackendFixture {
            let _ = env_logger::builder().is_test(true).try_init();
            let db_connections = sqlite::Connections::init(":memory:", 1).unwrap();
            raydb_db_sqlite::run_embedded_database_migrations(db_connections.exclusive().unwrap())
                .unwrap();
            let moderator = user(2, vec![Role::Moderator]);
            db_connections
                .exclusive()
                .unwrap()
                .add_user_to_role(
                    &RoleMember {
                        user_id: moderator.id,
                        name: moderator.name.clone(),
                    },
                    Role::Moderator,
                    UserId::new(1),
                )
                .unwrap();
            let search_engine = tantivy::SearchEngine::init_in_ram().unwrap();
            let tags = TagKeywords::new(HashMap::from([(
                "shop=bakery".to_string(),
                vec!["bread".to_string(), "pastry".to_string()],
            )]));
            BackendFixture {
                db_connections,
                search_engine: RefCell::new(search_engine),
                messenger: RecordingMessenger::default(),
                tags,
                admin: user(1, vec![Role::Admin]),
                moderator,
                visitor: user(7, vec![]),
            }
        }

        pub fn moderators(&self) -> Moderators {
            Moderators {
                messenger: &self.messenger,
                admin: Some(self.admin.id),
            }
        }

        pub fn save_poi(&self, user: &UserInfo, poi: Poi) -> crate::Result<usecases::SaveOutcome> {
            flows::save_poi(
                &self.db_connections,
                &mut *self.search_engine.borrow_mut(),
                &self.tags,
                self.moderators(),
                user,
                poi,
            )
        }

        pub fn save_poi_as_moderator(&self, poi: Poi) -> PoiId {
            self.save_poi(&self.moderator, poi).unwrap().poi_id()
        }

        pub fn create_poi(&self, name: &str, keywords: &str) -> PoiId {
            self.save_poi_as_moderator(
                Poi::build()
                    .name(name)
                    .keywords(keywords)
                    .pos(30.0, 60.0)
                    .finish(),
            )
        }

        pub fn apply_queue(&self, id: QueueId) -> crate::Result<usecases::QueueOutcome> {
            flows::apply_queue(
                &self.db_connections,
                &mut *self.search_engine.borrow_mut(),
                &self.tags,
                &self.moderator,
                id,
            )
        }

        pub fn delete_poi(&self, id: PoiId, reason: &str) -> crate::Result<Poi> {
            flows::delete_poi(
                &self.db_connections,
                &mut *self.search_engine.borrow_mut(),
                &self.tags,
                &self.moderator,
                id,
                reason,
            )
        }

        pub fn purge_poi(&self, id: PoiId) -> crate::Result<()> {
            flows::purge_poi(
                &self.db_connections,
                &mut *self.search_engine.borrow_mut(),
                &self.moderator,
                id,
            )
        }

        pub fn poi(&self, id: PoiId) -> Poi {
            self.db_connections
                .shared()
                .unwrap()
                .get_poi_by_id(id)
                .unwrap()
        }

        pub fn query(&self, text: &str) -> Vec<PoiId> {
            let tokens: Vec<_> = text.split_whitespace().map(ToString::to_string).collect();
            let pois = usecases::find_pois(
                &self.db_connections.shared().unwrap(),
                &*self.search_engine.borrow(),
                &tokens,
            )
            .unwrap();
            pois.into_iter().filter_map(|p| p.id).collect()
        }
    }
}

use self::prelude::*;
use raydb_entities::builders::*;

#[test]
fn queued_edit_of_visitor_only_changes_the_poi_when_applied() {
    let fixture = BackendFixture::new();
    let id = fixture.create_poi("A", "shop");
    let audit_before = fixture
        .db_connections
        .shared()
        .unwrap()
        .get_audit_of_poi(id)
        .unwrap()
        .len();

    let mut poi = fixture.poi(id);
    poi.name = "B".into();
    poi.comment = Some("x".into());
    let outcome = fixture.save_poi(&fixture.visitor, poi).unwrap();
    assert_eq!(usecases::SaveOutcome::Queued { id, entries: 2 }, outcome);

    let queue = fixture.db_connections.shared().unwrap().get_queue(10).unwrap();
    assert_eq!(2, queue.len());
    assert_eq!("A", fixture.poi(id).name);
    assert!(fixture.poi(id).comment.is_none());
    assert_eq!(
        audit_before,
        fixture.db_connections.shared().unwrap().get_audit_of_poi(id).unwrap().len()
    );

    for (applied, entry) in queue.iter().enumerate() {
        fixture.apply_queue(entry.id).unwrap();
        let audit = fixture.db_connections.shared().unwrap().get_audit_of_poi(id).unwrap();
        assert_eq!(audit_before + applied + 1, audit.len());
        let last = audit.last().unwrap();
        assert_eq!(fixture.visitor.id, last.submitter);
        assert_eq!(Some(fixture.moderator.id), last.approver);
    }
    let poi = fixture.poi(id);
    assert_eq!("B", poi.name);
    assert_eq!(Some("x"), poi.comment.as_deref());
    assert_eq!(0, fixture.db_connections.shared().unwrap().count_queue().unwrap());
}

#[test]
fn poi_of_visitor_waits_in_the_unchecked_feed() {
    let fixture = BackendFixture::new();
    let first = fixture
        .save_poi(&fixture.visitor, Poi::build().name("First").finish())
        .unwrap()
        .poi_id();
    let second = fixture
        .save_poi(&fixture.visitor, Poi::build().name("Second").finish())
        .unwrap()
        .poi_id();
    assert!(fixture.poi(first).needs_check);

    let conn = fixture.db_connections.shared().unwrap();
    let audit = conn.get_audit_of_poi(first).unwrap();
    assert_eq!(1, audit.len());
    assert!(matches!(audit[0].change, AuditChange::Created { .. }));
    let next = usecases::next_unchecked(&conn, &fixture.moderator).unwrap().unwrap();
    assert_eq!(Some(first), next.id);
    drop(conn);

    flows::validate_poi(&fixture.db_connections, &fixture.moderator, first).unwrap();
    let conn = fixture.db_connections.shared().unwrap();
    assert_eq!(1, conn.get_audit_of_poi(first).unwrap().len());
    let next = usecases::next_unchecked(&conn, &fixture.moderator).unwrap().unwrap();
    assert_eq!(Some(second), next.id);
}

#[test]
fn search_skips_deleted_pois_and_address_infrastructure() {
    let fixture = BackendFixture::new();
    let shop = fixture.create_poi("Corner shop", "milk");
    let closed = fixture.create_poi("Old shop", "milk");
    fixture.save_poi_as_moderator(
        Poi::build().key("m6").name("Milk house").tag(TAG_BUILDING).finish(),
    );
    fixture.delete_poi(closed, "closed").unwrap();
    assert_eq!(vec![shop], fixture.query("milk"));

    let count = flows::reindex(
        &fixture.db_connections,
        &mut *fixture.search_engine.borrow_mut(),
        &fixture.tags,
    )
    .unwrap();
    assert_eq!(1, count);
    assert_eq!(vec![shop], fixture.query("milk"));
}
