//! End-to-end: upload a site and a shoot into an in-memory bucket, index it,
//! then resolve the mapping the way the site does.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use portfolio_r2::config::{BucketConfig, PortfolioConfig, ResolveConfig, ResolvePolicy};
use portfolio_r2::index;
use portfolio_r2::resolve::{self, ResolveError};
use portfolio_r2::store::{ListPage, ObjectStore, PutObject, StoreError};
use portfolio_r2::upload;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

/// Bucket held in memory, listed in pages of `page_size` keys in key order.
struct MemoryBucket {
    objects: Mutex<BTreeMap<String, PutObject>>,
    page_size: usize,
}

impl MemoryBucket {
    fn new(page_size: usize) -> Self {
        Self {
            objects: Mutex::new(BTreeMap::new()),
            page_size,
        }
    }

    fn insert_raw(&self, key: &str) {
        self.objects.lock().unwrap().insert(
            key.to_string(),
            PutObject {
                key: key.to_string(),
                body: Vec::new(),
                content_type: "application/octet-stream".to_string(),
                cache_control: String::new(),
            },
        );
    }

    fn object(&self, key: &str) -> Option<PutObject> {
        self.objects.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl ObjectStore for MemoryBucket {
    async fn list_page(&self, continuation_token: Option<&str>) -> Result<ListPage, StoreError> {
        let objects = self.objects.lock().unwrap();
        let keys: Vec<String> = objects
            .keys()
            .filter(|k| continuation_token.is_none_or(|after| k.as_str() > after))
            .take(self.page_size + 1)
            .cloned()
            .collect();
        let (page, more) = if keys.len() > self.page_size {
            (keys[..self.page_size].to_vec(), true)
        } else {
            (keys, false)
        };
        let next_token = if more { page.last().cloned() } else { None };
        Ok(ListPage {
            keys: page,
            next_token,
        })
    }

    async fn put(&self, object: PutObject) -> Result<(), StoreError> {
        self.objects
            .lock()
            .unwrap()
            .insert(object.key.clone(), object);
        Ok(())
    }
}

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[tokio::test]
async fn upload_index_and_resolve() {
    let tmp = TempDir::new().unwrap();
    let config = PortfolioConfig::default();

    // Built site plus two shoots, one with a typographic apostrophe.
    let dist = tmp.path().join("dist");
    write(&dist.join("index.html"), "<html></html>");
    write(&dist.join("css/style.css"), "body{}");
    let shoots = tmp.path().join("shoots");
    write(&shoots.join("ABI/b.jpg"), "b");
    write(&shoots.join("ABI/a.jpg"), "a");
    write(&shoots.join("ABI/notes.txt"), "not an image");
    write(&shoots.join("STREET SOUK 23\u{2019}/ss1.JPG"), "s");

    let bucket = MemoryBucket::new(2);
    let site = upload::upload(&bucket, &dist, None, &config.upload, 1, None)
        .await
        .unwrap();
    assert_eq!(site.uploaded, 2);
    let shots = upload::upload(&bucket, &shoots, None, &config.upload, 3, None)
        .await
        .unwrap();
    assert_eq!(shots.uploaded, 4);
    bucket.insert_raw("GUNNA/");
    bucket.insert_raw("GUNNA/raw/g1.jpg");
    bucket.insert_raw("GUNNA/g1.jpg");

    let html = bucket.object("index.html").unwrap();
    assert_eq!(html.cache_control, "public, max-age=60, must-revalidate");
    let photo = bucket.object("STREET SOUK 23\u{2019}/ss1.JPG").unwrap();
    assert_eq!(photo.content_type, "image/jpeg");

    // Index
    let generated_at = Utc.with_ymd_and_hms(2025, 2, 3, 4, 5, 6).unwrap();
    let built = index::build_index(&bucket, "portfolio", "https://pub-abc.r2.dev/", generated_at)
        .await
        .unwrap();
    assert_eq!(
        built.folder_names().collect::<Vec<_>>(),
        vec!["ABI", "GUNNA", "STREET SOUK 23\u{2019}"]
    );
    assert_eq!(built.files("ABI").unwrap(), ["a.jpg", "b.jpg"]);
    assert_eq!(built.files("GUNNA").unwrap(), ["g1.jpg"]);

    let index_path = tmp.path().join("dist/portfolio-index.json");
    index::write_index(&index_path, &built).unwrap();
    let reloaded = index::load_index(&index_path).unwrap();
    assert_eq!(reloaded, built);

    // Rebuilding over the same bucket gives the same folders.
    let again = index::build_index(&bucket, "portfolio", "https://pub-abc.r2.dev/", Utc::now())
        .await
        .unwrap();
    assert_eq!(again.folders, built.folders);

    // Resolve
    let mapping_path = tmp.path().join("dist/portfolio-mapping.json");
    write(
        &mapping_path,
        r#"{
  "categoriesOrder": ["brandcampaignshoot", "event"],
  "mappings": {
    "ABI": { "displayName": "Asabi Pilot", "category": "brandcampaignshoot" },
    "STREET SOUK 23'": { "category": "event" },
    "OLD SHOOT": { "displayName": "Old", "category": "event" }
  }
}"#,
    );
    let mapping = resolve::load_mapping(&mapping_path).unwrap();

    let catalog = resolve::resolve(&mapping, &reloaded, &ResolveConfig::default()).unwrap();
    assert_eq!(
        catalog.category("brandcampaignshoot").unwrap(),
        ["Asabi Pilot", "GUNNA"]
    );
    assert_eq!(
        catalog.category("event").unwrap(),
        ["Old", "STREET SOUK 23'"]
    );

    let strict = ResolveConfig {
        policy: ResolvePolicy::Strict,
        include_unmapped: true,
    };
    let strict_catalog = resolve::resolve(&mapping, &reloaded, &strict).unwrap();
    assert_eq!(
        strict_catalog.category("event").unwrap(),
        ["STREET SOUK 23'"]
    );

    // Galleries, on the public URL that replaced the legacy r2.dev host.
    let bucket_config = BucketConfig {
        public_base_url: "https://photos.example.com".to_string(),
        legacy_hosts: vec!["pub-abc.r2.dev".to_string()],
    };
    let base = resolve::public_base_url(&reloaded, &bucket_config);
    let souk = resolve::lookup_gallery("STREET SOUK 23'", &catalog, &reloaded, &base).unwrap();
    assert_eq!(souk.folder, "STREET SOUK 23\u{2019}");
    assert_eq!(
        souk.images[0].url,
        "https://photos.example.com/STREET%20SOUK%2023%E2%80%99/ss1.JPG"
    );
    assert_eq!(
        resolve::lookup_gallery("Old", &catalog, &reloaded, &base),
        Err(ResolveError::FolderNotFound("Old".to_string()))
    );

    let featured = resolve::featured_items(&mapping, &reloaded, &base);
    let folders: Vec<&str> = featured.iter().map(|f| f.folder.as_str()).collect();
    assert_eq!(folders, vec!["ABI", "STREET SOUK 23\u{2019}"]);
    assert_eq!(featured[0].image_url, "https://photos.example.com/ABI/a.jpg");

    let report = resolve::check_mapping(&mapping, &reloaded);
    assert_eq!(report.stale, vec!["OLD SHOOT"]);
    assert_eq!(report.unmapped, vec!["GUNNA"]);
    assert!(report.shadowed.is_empty());
}
