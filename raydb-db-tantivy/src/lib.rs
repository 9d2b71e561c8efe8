//! Full-text index of the searchable POIs.

use std::{path::Path, sync::Arc};

use anyhow::{bail, Result as Fallible};
use parking_lot::Mutex;
use tantivy::{
    collector::TopDocs,
    directory::MmapDirectory,
    query::{BooleanQuery, Occur, Query, TermQuery},
    schema::*,
    tokenizer::{
        LowerCaser, RemoveLongFilter, SimpleTokenizer, TextAnalyzer, Token, TokenFilter,
        TokenStream, Tokenizer,
    },
    Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term,
};

use raydb_core::{
    db::{IdIndexer, Indexer, PoiIndex, PoiIndexer},
    entities::*,
};

const OVERALL_INDEX_HEAP_SIZE_IN_BYTES: usize = 50_000_000;

const TEXT_TOKENIZER: &str = "folded";

struct PoiFields {
    id: Field,
    name: Field,
    keywords: Field,
    tag_keywords: Field,
}

impl PoiFields {
    fn text_fields(&self) -> [Field; 3] {
        [self.name, self.keywords, self.tag_keywords]
    }
}

fn build_schema() -> (Schema, PoiFields) {
    let text_options = TextOptions::default().set_indexing_options(
        TextFieldIndexing::default()
            .set_tokenizer(TEXT_TOKENIZER)
            .set_index_option(IndexRecordOption::WithFreqs),
    );
    let mut schema_builder = SchemaBuilder::default();
    let id = schema_builder.add_i64_field("id", INDEXED | STORED);
    let name = schema_builder.add_text_field("name", text_options.clone());
    let keywords = schema_builder.add_text_field("keywords", text_options.clone());
    let tag_keywords = schema_builder.add_text_field("tag_keywords", text_options);
    let schema = schema_builder.build();
    let fields = PoiFields {
        id,
        name,
        keywords,
        tag_keywords,
    };
    (schema, fields)
}

fn register_tokenizers(index: &Index) {
    let analyzer = TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(RemoveLongFilter::limit(40))
        .filter(LowerCaser)
        .filter(YoFolding)
        .build();
    index.tokenizers().register(TEXT_TOKENIZER, analyzer);
}

/// Replaces `ё` with `е`, must run after lowercasing.
#[derive(Clone, Copy)]
struct YoFolding;

impl TokenFilter for YoFolding {
    type Tokenizer<T: Tokenizer> = YoFoldingFilter<T>;

    fn transform<T: Tokenizer>(self, tokenizer: T) -> YoFoldingFilter<T> {
        YoFoldingFilter(tokenizer)
    }
}

#[derive(Clone)]
struct YoFoldingFilter<T>(T);

impl<T: Tokenizer> Tokenizer for YoFoldingFilter<T> {
    type TokenStream<'a> = YoFoldingStream<T::TokenStream<'a>>;

    fn token_stream<'a>(&'a mut self, text: &'a str) -> Self::TokenStream<'a> {
        YoFoldingStream(self.0.token_stream(text))
    }
}

struct YoFoldingStream<T>(T);

impl<T: TokenStream> TokenStream for YoFoldingStream<T> {
    fn advance(&mut self) -> bool {
        if !self.0.advance() {
            return false;
        }
        let token = self.0.token_mut();
        if token.text.contains('ё') {
            token.text = token.text.replace('ё', "е");
        }
        true
    }

    fn token(&self) -> &Token {
        self.0.token()
    }

    fn token_mut(&mut self) -> &mut Token {
        self.0.token_mut()
    }
}

pub struct TantivyPoiIndex {
    fields: PoiFields,
    index: Index,
    reader: IndexReader,
    writer: IndexWriter,
}

impl TantivyPoiIndex {
    pub fn create_in_ram() -> Fallible<Self> {
        let no_path: Option<&Path> = None;
        Self::create(no_path)
    }

    pub fn create<P: AsRef<Path>>(path: Option<P>) -> Fallible<Self> {
        let (schema, fields) = build_schema();
        let index = if let Some(path) = path {
            log::info!(
                "Opening full-text search index in directory: {}",
                path.as_ref().display()
            );
            std::fs::create_dir_all(path.as_ref())?;
            Index::open_or_create(MmapDirectory::open(path)?, schema)?
        } else {
            log::warn!("Creating full-text search index in RAM");
            Index::create_in_ram(schema)
        };
        register_tokenizers(&index);
        let writer = index.writer_with_num_threads(1, OVERALL_INDEX_HEAP_SIZE_IN_BYTES)?;
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;
        Ok(Self {
            fields,
            index,
            reader,
            writer,
        })
    }

    // Terms as the indexed text would produce them
    fn query_terms(&self, text: &str) -> Fallible<Vec<String>> {
        let mut analyzer = self.index.tokenizer_for_field(self.fields.name)?;
        let mut stream = analyzer.token_stream(text);
        let mut terms = vec![];
        stream.process(&mut |token| terms.push(token.text.clone()));
        terms.dedup();
        Ok(terms)
    }
}

impl Indexer for TantivyPoiIndex {
    fn flush_index(&mut self) -> Fallible<()> {
        self.writer.commit()?;
        self.reader.reload()?;
        Ok(())
    }
}

impl IdIndexer for TantivyPoiIndex {
    fn remove_by_id(&self, id: PoiId) -> Fallible<()> {
        let id_term = Term::from_field_i64(self.fields.id, id.into());
        self.writer.delete_term(id_term);
        Ok(())
    }
}

impl PoiIndex for TantivyPoiIndex {
    fn query_poi_ids(&self, text: &str, limit: usize) -> Fallible<Vec<PoiId>> {
        if limit == 0 {
            bail!("Invalid limit: {limit}");
        }
        let terms = self.query_terms(text)?;
        if terms.is_empty() {
            return Ok(vec![]);
        }
        // Every term must occur in at least one of the text fields
        let sub_queries: Vec<(Occur, Box<dyn Query>)> = terms
            .iter()
            .map(|term| {
                let field_queries: Vec<(Occur, Box<dyn Query>)> = self
                    .fields
                    .text_fields()
                    .into_iter()
                    .map(|field| {
                        let term = Term::from_field_text(field, term);
                        let query: Box<dyn Query> =
                            Box::new(TermQuery::new(term, IndexRecordOption::Basic));
                        (Occur::Should, query)
                    })
                    .collect();
                let query: Box<dyn Query> = Box::new(BooleanQuery::new(field_queries));
                (Occur::Must, query)
            })
            .collect();
        let query = BooleanQuery::new(sub_queries);
        let searcher = self.reader.searcher();
        let top_docs = searcher.search(&query, &TopDocs::with_limit(limit))?;
        let mut ids = Vec::with_capacity(top_docs.len());
        for (_score, doc_addr) in top_docs {
            match searcher.doc::<TantivyDocument>(doc_addr) {
                Ok(doc) => match doc.get_first(self.fields.id).and_then(|v| v.as_i64()) {
                    Some(id) => ids.push(PoiId::new(id)),
                    None => log::error!("Missing POI id in document {doc_addr:?}"),
                },
                Err(err) => {
                    log::warn!("Failed to load document {doc_addr:?}: {err}");
                }
            }
        }
        Ok(ids)
    }
}

impl PoiIndexer for TantivyPoiIndex {
    fn add_or_update_poi(&self, poi: &Poi, tag_keywords: &[String]) -> Fallible<()> {
        let Some(id) = poi.id else {
            bail!("Cannot index POI {:?} without an id", poi.name);
        };
        self.remove_by_id(id)?;
        let mut doc = TantivyDocument::default();
        doc.add_i64(self.fields.id, id.into());
        doc.add_text(self.fields.name, &poi.name);
        doc.add_text(self.fields.keywords, &poi.keywords);
        for keyword in tag_keywords {
            doc.add_text(self.fields.tag_keywords, keyword);
        }
        self.writer.add_document(doc)?;
        Ok(())
    }
}

/// Shared handle to the index.
#[derive(Clone)]
pub struct SearchEngine(Arc<Mutex<TantivyPoiIndex>>);

impl SearchEngine {
    pub fn init_in_ram() -> Fallible<SearchEngine> {
        let index = TantivyPoiIndex::create_in_ram()?;
        Ok(SearchEngine(Arc::new(Mutex::new(index))))
    }

    pub fn init_with_path<P: AsRef<Path>>(path: Option<P>) -> Fallible<SearchEngine> {
        let index = TantivyPoiIndex::create(path)?;
        Ok(SearchEngine(Arc::new(Mutex::new(index))))
    }
}

impl Indexer for SearchEngine {
    fn flush_index(&mut self) -> Fallible<()> {
        self.0.lock().flush_index()
    }
}

impl IdIndexer for SearchEngine {
    fn remove_by_id(&self, id: PoiId) -> Fallible<()> {
        self.0.lock().remove_by_id(id)
    }
}

impl PoiIndex for SearchEngine {
    fn query_poi_ids(&self, text: &str, limit: usize) -> Fallible<Vec<PoiId>> {
        self.0.lock().query_poi_ids(text, limit)
    }
}

impl PoiIndexer for SearchEngine {
    fn add_or_update_poi(&self, poi: &Poi, tag_keywords: &[String]) -> Fallible<()> {
        self.0.lock().add_or_update_poi(poi, tag_keywords)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raydb_entities::builders::*;

    fn poi(id: i64, name: &str, keywords: &str) -> Poi {
        Poi::build().id(id).name(name).keywords(keywords).finish()
    }

    fn query(index: &impl PoiIndex, text: &str) -> Vec<i64> {
        let mut ids: Vec<_> = index
            .query_poi_ids(text, 10)
            .unwrap()
            .into_iter()
            .map(i64::from)
            .collect();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn should_require_all_terms_across_fields() {
        let mut index = TantivyPoiIndex::create_in_ram().unwrap();
        index
            .add_or_update_poi(&poi(1, "Corner Bakery", "bread"), &["pastry".into()])
            .unwrap();
        index
            .add_or_update_poi(&poi(2, "Dairy", "milk bread"), &[])
            .unwrap();
        index.flush_index().unwrap();
        assert_eq!(vec![1, 2], query(&index, "bread"));
        assert_eq!(vec![1], query(&index, "BREAD pastry"));
        assert_eq!(vec![2], query(&index, "milk"));
        assert!(query(&index, "milk pastry").is_empty());
        assert!(query(&index, " ").is_empty());
    }

    #[test]
    fn should_fold_yo() {
        let mut index = TantivyPoiIndex::create_in_ram().unwrap();
        index
            .add_or_update_poi(&poi(3, "Ёлка", "ёжик"), &[])
            .unwrap();
        index.flush_index().unwrap();
        assert_eq!(vec![3], query(&index, "елка"));
        assert_eq!(vec![3], query(&index, "ЁЖИК"));
    }

    #[test]
    fn should_replace_and_remove_documents() {
        let mut index = TantivyPoiIndex::create_in_ram().unwrap();
        index.add_or_update_poi(&poi(4, "Kiosk", ""), &[]).unwrap();
        index.flush_index().unwrap();
        index.add_or_update_poi(&poi(4, "Stand", ""), &[]).unwrap();
        index.flush_index().unwrap();
        assert!(query(&index, "kiosk").is_empty());
        assert_eq!(vec![4], query(&index, "stand"));
        index.remove_by_id(PoiId::new(4)).unwrap();
        index.flush_index().unwrap();
        assert!(query(&index, "stand").is_empty());
    }

    #[test]
    fn should_reopen_index_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut engine = SearchEngine::init_with_path(Some(dir.path())).unwrap();
            engine.add_or_update_poi(&poi(5, "Florist", "flowers"), &[]).unwrap();
            engine.flush_index().unwrap();
        }
        let engine = SearchEngine::init_with_path(Some(dir.path())).unwrap();
        assert_eq!(vec![5], query(&engine, "flowers"));
    }

    #[test]
    fn should_reject_pois_without_id() {
        let index = TantivyPoiIndex::create_in_ram().unwrap();
        let poi = Poi::build().name("New").finish();
        assert!(index.add_or_update_poi(&poi, &[]).is_err());
    }
}
