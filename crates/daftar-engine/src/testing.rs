//! Fakes and fixtures shared by the engine's unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use daftar_core::{Document, DocumentKind, Draft, Item, ItemInput, Money, Party, PartyInput, PartyKind};
use daftar_db::{CollectionStore, CollectionWrite, Database, DbConfig, DbError, DbResult};
use serde_json::Value;

use crate::books::{Books, BooksBuilder};
use crate::ports::{ConfirmRequest, ConfirmationGate, Notification, NotificationSink, NotifyLevel};
use crate::telemetry;

pub const NAMESPACE: &str = "shop";

/// In-memory SQLite whose writes can be switched off.
pub struct FlakyStore {
    inner: Database,
    failing: AtomicBool,
    batches: AtomicUsize,
}

impl FlakyStore {
    pub async fn new() -> Self {
        FlakyStore {
            inner: Database::new(DbConfig::in_memory()).await.unwrap(),
            failing: AtomicBool::new(false),
            batches: AtomicUsize::new(0),
        }
    }

    pub fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Successful batches so far.
    pub fn batches(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CollectionStore for FlakyStore {
    async fn load(&self, namespace: &str, name: &str) -> DbResult<Option<Value>> {
        self.inner.load(namespace, name).await
    }

    async fn save_batch(&self, namespace: &str, writes: &[CollectionWrite]) -> DbResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DbError::Unavailable("simulated outage".to_string()));
        }
        self.inner.save_batch(namespace, writes).await?;
        self.batches.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn all(&self) -> Vec<Notification> {
        self.seen.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<Notification> {
        self.all().pop()
    }

    fn count(&self, level: NotifyLevel) -> usize {
        self.all().iter().filter(|n| n.level == level).count()
    }

    pub fn errors(&self) -> usize {
        self.count(NotifyLevel::Error)
    }

    pub fn warnings(&self) -> usize {
        self.count(NotifyLevel::Warning)
    }
}

impl NotificationSink for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen.lock().unwrap().push(notification);
    }
}

/// Answers every prompt with a preset value and remembers the questions.
pub struct ScriptedConfirm {
    answer: AtomicBool,
    asked: Mutex<Vec<ConfirmRequest>>,
}

impl ScriptedConfirm {
    pub fn answer(&self, yes: bool) {
        self.answer.store(yes, Ordering::SeqCst);
    }

    pub fn asked(&self) -> usize {
        self.asked.lock().unwrap().len()
    }
}

impl Default for ScriptedConfirm {
    fn default() -> Self {
        ScriptedConfirm {
            answer: AtomicBool::new(true),
            asked: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ConfirmationGate for ScriptedConfirm {
    async fn confirm(&self, request: &ConfirmRequest) -> bool {
        self.asked.lock().unwrap().push(request.clone());
        self.answer.load(Ordering::SeqCst)
    }
}

pub struct Harness {
    pub store: Arc<FlakyStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub confirm: Arc<ScriptedConfirm>,
}

impl Harness {
    pub async fn new() -> Self {
        telemetry::init_tracing();
        Harness {
            store: Arc::new(FlakyStore::new().await),
            notifier: Arc::new(RecordingNotifier::default()),
            confirm: Arc::new(ScriptedConfirm::default()),
        }
    }

    /// Opens (or reopens) the books over the shared store.
    pub async fn open(&self) -> Books {
        BooksBuilder::new(self.store.clone(), NAMESPACE)
            .confirmation(self.confirm.clone())
            .notifications(self.notifier.clone())
            .open()
            .await
            .unwrap()
    }
}

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

/// "Widget", cost 30, price 50.
pub async fn add_widget(books: &mut Books, stock: i64) -> Item {
    add_item(books, "Widget", stock).await
}

pub async fn add_item(books: &mut Books, name: &str, stock: i64) -> Item {
    books
        .add_item(ItemInput {
            name: name.to_string(),
            cost: Money::from_major(30),
            price: Money::from_major(50),
            opening_stock: stock,
        })
        .await
        .unwrap()
}

pub async fn add_party(books: &mut Books, kind: PartyKind, name: &str) -> Party {
    books
        .add_party(
            kind,
            PartyInput {
                name: name.to_string(),
                ..PartyInput::default()
            },
        )
        .await
        .unwrap()
}

/// A fresh draft for `party` with the given `(item id, quantity, unit amount in major units)` lines.
pub fn draft(books: &Books, kind: DocumentKind, party: &Party, lines: &[(&str, i64, i64)]) -> Draft {
    let mut draft = books.new_draft(kind);
    draft.set_date(day(1));
    draft.set_party(party.id.clone());
    for (item_id, quantity, amount) in lines {
        books
            .add_line(&mut draft, item_id, *quantity, Money::from_major(*amount))
            .unwrap();
    }
    draft
}

/// Commits a one-line sale of `quantity` × 50.
pub async fn sell(books: &mut Books, customer: &Party, item: &Item, quantity: i64) -> Document {
    let draft = draft(books, DocumentKind::Sale, customer, &[(item.id.as_str(), quantity, 50)]);
    books.commit_draft(&draft).await.unwrap()
}

/// Commits a one-line purchase of `quantity` × 30.
pub async fn buy(books: &mut Books, supplier: &Party, item: &Item, quantity: i64) -> Document {
    let draft = draft(books, DocumentKind::Purchase, supplier, &[(item.id.as_str(), quantity, 30)]);
    books.commit_draft(&draft).await.unwrap()
}
