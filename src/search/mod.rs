//! Tantivy-based customer search index.
//!
//! Lets admins find accounts by account number, phone number or name when
//! building assignment batches. The index only stores ids; results are read
//! back from the database so they always reflect live status.

use std::path::Path;
use std::sync::Arc;
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, BoostQuery, Occur, Query, QueryParser};
use tantivy::schema::{Field, Schema, Value, STORED, STRING, TEXT};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tokio::sync::RwLock;

use crate::errors::AppError;
use crate::models::Customer;

const BOOST_ACCOUNT_NUMBER: f32 = 10.0;
const BOOST_CONTACT_NUMBER: f32 = 8.0;
const BOOST_NAME: f32 = 6.0;
const BOOST_REGION: f32 = 2.0;

/// Deepest hit position a search will page to.
const MAX_RESULT_WINDOW: usize = 10_000;

/// Search hit with relevance score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub customer_id: String,
    pub score: f32,
}

struct SearchFields {
    customer_id: Field,
    account_number: Field,
    contact_number: Field,
    name: Field,
    region: Field,
}

/// Tantivy search index for customers.
pub struct SearchIndex {
    index: Index,
    reader: IndexReader,
    writer: Arc<RwLock<IndexWriter>>,
    fields: SearchFields,
}

impl SearchIndex {
    /// Create or open a search index at the specified path.
    pub fn open(index_path: &Path) -> Result<Self, AppError> {
        std::fs::create_dir_all(index_path)
            .map_err(|e| AppError::Search(format!("Failed to create index directory: {}", e)))?;

        let mut schema_builder = Schema::builder();
        // STRING so the id can be used as a delete term.
        let customer_id = schema_builder.add_text_field("customer_id", STRING | STORED);
        let account_number = schema_builder.add_text_field("account_number", TEXT);
        let contact_number = schema_builder.add_text_field("contact_number", TEXT);
        let name = schema_builder.add_text_field("name", TEXT);
        let region = schema_builder.add_text_field("region", TEXT);
        let schema = schema_builder.build();

        let fields = SearchFields {
            customer_id,
            account_number,
            contact_number,
            name,
            region,
        };

        let index = Index::open_in_dir(index_path)
            .or_else(|_| Index::create_in_dir(index_path, schema.clone()))
            .map_err(|e| AppError::Search(format!("Failed to open/create index: {}", e)))?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()
            .map_err(|e| AppError::Search(format!("Failed to create reader: {}", e)))?;

        let writer = index
            .writer(50_000_000) // 50MB buffer
            .map_err(|e| AppError::Search(format!("Failed to create writer: {}", e)))?;

        Ok(Self {
            index,
            reader,
            writer: Arc::new(RwLock::new(writer)),
            fields,
        })
    }

    /// Rebuild the entire index from the customer store.
    pub async fn rebuild(&self, customers: &[Customer]) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        writer.delete_all_documents()?;
        for customer in customers {
            writer.add_document(self.create_document(customer))?;
        }
        writer.commit()?;
        self.reader.reload()?;

        tracing::info!("Search index rebuilt with {} customers", customers.len());
        Ok(())
    }

    /// Insert or replace a batch of customers with a single commit.
    pub async fn index_customers(&self, customers: &[Customer]) -> Result<(), AppError> {
        if customers.is_empty() {
            return Ok(());
        }
        let mut writer = self.writer.write().await;

        for customer in customers {
            writer.delete_term(Term::from_field_text(self.fields.customer_id, &customer.id));
            writer.add_document(self.create_document(customer))?;
        }
        writer.commit()?;
        self.reader.reload()?;

        Ok(())
    }

    /// Search for customers matching the query.
    pub fn search(
        &self,
        query_str: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SearchResult>, AppError> {
        let window = limit.saturating_add(offset).min(MAX_RESULT_WINDOW);
        if query_str.trim().is_empty() || offset >= window {
            return Ok(Vec::new());
        }

        let searcher = self.reader.searcher();

        let field_queries = [
            (self.fields.account_number, BOOST_ACCOUNT_NUMBER),
            (self.fields.contact_number, BOOST_CONTACT_NUMBER),
            (self.fields.name, BOOST_NAME),
            (self.fields.region, BOOST_REGION),
        ];

        let query_parser = QueryParser::for_index(
            &self.index,
            field_queries.iter().map(|(field, _)| *field).collect(),
        );
        let base_query = query_parser
            .parse_query(query_str)
            .map_err(|e| AppError::Validation(format!("Invalid search query: {}", e)))?;

        let mut subqueries: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        for (field, boost) in field_queries {
            let field_parser = QueryParser::for_index(&self.index, vec![field]);
            if let Ok(field_query) = field_parser.parse_query(query_str) {
                subqueries.push((Occur::Should, Box::new(BoostQuery::new(field_query, boost))));
            }
        }

        let combined_query = if subqueries.is_empty() {
            base_query
        } else {
            Box::new(BooleanQuery::new(subqueries))
        };

        let top_docs = searcher
            .search(&combined_query, &TopDocs::with_limit(window))
            .map_err(|e| AppError::Search(format!("Search failed: {}", e)))?;

        let results = top_docs
            .into_iter()
            .skip(offset)
            .take(limit)
            .filter_map(|(score, doc_address)| {
                let doc: TantivyDocument = searcher.doc(doc_address).ok()?;
                let customer_id = doc.get_first(self.fields.customer_id)?.as_str()?.to_string();
                Some(SearchResult { customer_id, score })
            })
            .collect();

        Ok(results)
    }

    fn create_document(&self, customer: &Customer) -> TantivyDocument {
        doc!(
            self.fields.customer_id => customer.id.clone(),
            self.fields.account_number => customer.account_number.clone(),
            self.fields.contact_number => customer.contact_number.clone(),
            self.fields.name => customer.name.clone(),
            self.fields.region => customer.region.clone().unwrap_or_default()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CustomerStatus;
    use tempfile::TempDir;

    fn create_test_customer(id: &str, account: &str, name: &str, phone: &str) -> Customer {
        Customer {
            id: id.to_string(),
            account_number: account.to_string(),
            name: name.to_string(),
            contact_number: phone.to_string(),
            amount_overdue: 1200.0,
            days_overdue: 40,
            status: CustomerStatus::Unassigned,
            response: None,
            previous_response: None,
            region: Some("Western".to_string()),
            rtom: None,
            assigned_to: None,
            assigned_date: None,
            contact_history: Vec::new(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
            updated_at: "2024-01-01T00:00:00Z".to_string(),
            version: 1,
        }
    }

    #[tokio::test]
    async fn test_search_by_name_and_account() {
        let temp_dir = TempDir::new().unwrap();
        let index = SearchIndex::open(temp_dir.path()).unwrap();

        let customers = vec![
            create_test_customer("a", "1001", "Nimal Perera", "0771234567"),
            create_test_customer("b", "1002", "Sunethra Fernando", "0719876543"),
        ];
        index.rebuild(&customers).await.unwrap();

        let by_name = index.search("sunethra", 10, 0).unwrap();
        assert_eq!(by_name[0].customer_id, "b");

        let by_account = index.search("1001", 10, 0).unwrap();
        assert_eq!(by_account[0].customer_id, "a");

        let by_phone = index.search("0719876543", 10, 0).unwrap();
        assert_eq!(by_phone[0].customer_id, "b");
    }

    #[tokio::test]
    async fn test_reindex_replaces_document() {
        let temp_dir = TempDir::new().unwrap();
        let index = SearchIndex::open(temp_dir.path()).unwrap();

        let mut customer = create_test_customer("a", "1001", "Nimal Perera", "0771234567");
        index.index_customers(&[customer.clone()]).await.unwrap();

        customer.name = "Nimal Jayasuriya".to_string();
        index.index_customers(&[customer]).await.unwrap();

        assert!(index.search("perera", 10, 0).unwrap().is_empty());
        let hits = index.search("jayasuriya", 10, 0).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn test_search_limit_edges() {
        let temp_dir = TempDir::new().unwrap();
        let index = SearchIndex::open(temp_dir.path()).unwrap();
        index
            .rebuild(&[create_test_customer("a", "1001", "Nimal Perera", "0771234567")])
            .await
            .unwrap();

        assert!(index.search("nimal", 0, 0).unwrap().is_empty());
        assert!(index.search("nimal", 10, usize::MAX).unwrap().is_empty());
        assert_eq!(index.search("nimal", usize::MAX, 0).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_search_empty_query() {
        let temp_dir = TempDir::new().unwrap();
        let index = SearchIndex::open(temp_dir.path()).unwrap();

        let results = index.search("", 10, 0).unwrap();
        assert!(results.is_empty());
    }
}
