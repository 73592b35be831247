//! Local calendar directory provider implementation.

use std::path::{Path, PathBuf};

use calsync_core::CalendarEntryData;
use tracing::{debug, info, warn};

use super::config::{CALENDAR_META_FILE, CalendarMeta, LocalConfig};
use super::ics::{parse_entries, render_entry};
use crate::error::{ProviderError, ProviderResult};
use crate::provider::{
    AccessStatus, BoxFuture, CalendarDescriptor, CalendarProvider, FetchOptions, NewCalendar,
};
use crate::record::ProviderEventRecord;

const PROVIDER_NAME: &str = "local";

/// Calendar provider backed by a directory tree.
///
/// ```text
/// <root>/
///   personal/
///     calendar.toml
///     3f0c...e1.ics
///   work/
///     calendar.toml
/// ```
#[derive(Debug, Clone)]
pub struct LocalProvider {
    config: LocalConfig,
}

impl LocalProvider {
    /// Creates a provider for the configured directory.
    ///
    /// The root directory does not need to exist yet; it then simply holds
    /// no calendars.
    pub fn new(config: LocalConfig) -> Self {
        Self { config }
    }

    /// Returns the provider configuration.
    pub fn config(&self) -> &LocalConfig {
        &self.config
    }

    async fn read_calendars(&self) -> ProviderResult<Vec<CalendarDescriptor>> {
        let mut calendars = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.config.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(root = %self.config.root.display(), "Calendar root does not exist yet");
                return Ok(calendars);
            }
            Err(e) => return Err(ProviderError::from(e).with_provider(PROVIDER_NAME)),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let meta = read_meta(&path).await?;
            if let Some(descriptor) = meta.into_descriptor(&path) {
                calendars.push(descriptor);
            }
        }

        calendars.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(calendars)
    }

    async fn read_calendar_entries(&self, calendar_id: &str) -> ProviderResult<Vec<ProviderEventRecord>> {
        let dir = self.config.calendar_dir(calendar_id);
        let mut records = Vec::new();
        let mut entries = tokio::fs::read_dir(&dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("ics") {
                continue;
            }
            let content = tokio::fs::read_to_string(&path).await?;
            records.extend(parse_entries(&content, calendar_id));
        }
        Ok(records)
    }

    async fn unique_calendar_id(&self, title: &str) -> ProviderResult<String> {
        let base = slugify(title);
        if !tokio::fs::try_exists(self.config.calendar_dir(&base)).await? {
            return Ok(base);
        }
        for n in 2..=100 {
            let candidate = format!("{}-{}", base, n);
            if !tokio::fs::try_exists(self.config.calendar_dir(&candidate)).await? {
                return Ok(candidate);
            }
        }
        Err(ProviderError::calendar(format!(
            "too many calendars named '{}'",
            title
        )))
    }
}

async fn read_meta(dir: &Path) -> ProviderResult<CalendarMeta> {
    let path = dir.join(CALENDAR_META_FILE);
    match tokio::fs::read_to_string(&path).await {
        Ok(content) => toml::from_str(&content).map_err(|e| {
            ProviderError::invalid_data(format!("{}: {}", path.display(), e))
                .with_provider(PROVIDER_NAME)
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(CalendarMeta::default()),
        Err(e) => Err(e.into()),
    }
}

/// Writes `content` next to `path` and renames it into place.
async fn write_atomic(path: &Path, content: &str) -> ProviderResult<()> {
    let tmp: PathBuf = path.with_extension("tmp");
    tokio::fs::write(&tmp, content).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

fn slugify(title: &str) -> String {
    let slug: String = title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    let slug = slug
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() {
        "calendar".to_string()
    } else {
        slug
    }
}

impl CalendarProvider for LocalProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn request_access(&self) -> BoxFuture<'_, ProviderResult<AccessStatus>> {
        Box::pin(async move { Ok(self.config.access) })
    }

    fn list_calendars(&self) -> BoxFuture<'_, ProviderResult<Vec<CalendarDescriptor>>> {
        Box::pin(self.read_calendars())
    }

    fn fetch_events(
        &self,
        options: FetchOptions,
    ) -> BoxFuture<'_, ProviderResult<Vec<ProviderEventRecord>>> {
        Box::pin(async move {
            let calendars = self.read_calendars().await?;
            let mut found = Vec::new();

            for calendar in calendars
                .iter()
                .filter(|c| options.includes_calendar(&c.id))
            {
                for record in self.read_calendar_entries(&calendar.id).await? {
                    if options.window.overlaps(record.start, record.end.max(record.start))
                        || options.window.contains(record.start)
                    {
                        found.push(record);
                    }
                }
            }

            found.sort_by_key(|r| r.start);
            if let Some(max) = options.max_results {
                found.truncate(max);
            }
            debug!(count = found.len(), window = %options.window, "Fetched local entries");
            Ok(found)
        })
    }

    fn create_event<'a>(
        &'a self,
        calendar_id: &'a str,
        entry: &'a CalendarEntryData,
    ) -> BoxFuture<'a, ProviderResult<String>> {
        Box::pin(async move {
            let dir = self.config.calendar_dir(calendar_id);
            if !tokio::fs::try_exists(&dir).await? {
                return Err(ProviderError::not_found(format!(
                    "calendar '{}' does not exist",
                    calendar_id
                ))
                .with_provider(PROVIDER_NAME));
            }
            if read_meta(&dir).await?.read_only {
                return Err(ProviderError::calendar(format!(
                    "calendar '{}' is read-only",
                    calendar_id
                ))
                .with_provider(PROVIDER_NAME));
            }

            let uid = uuid::Uuid::new_v4().to_string();
            let path = dir.join(format!("{}.ics", uid));
            write_atomic(&path, &render_entry(&uid, entry))
                .await
                .map_err(|e| e.with_provider(PROVIDER_NAME))?;

            info!(uid = %uid, calendar_id = %calendar_id, "Wrote calendar entry");
            Ok(uid)
        })
    }

    fn create_calendar<'a>(&'a self, spec: &'a NewCalendar) -> BoxFuture<'a, ProviderResult<String>> {
        Box::pin(async move {
            if !self.config.allow_calendar_creation {
                return Err(ProviderError::unsupported(
                    "calendar creation is disabled for this directory",
                )
                .with_provider(PROVIDER_NAME));
            }

            let id = self.unique_calendar_id(&spec.title).await?;
            let dir = self.config.calendar_dir(&id);
            tokio::fs::create_dir_all(&dir).await?;

            let meta = CalendarMeta {
                title: Some(spec.title.clone()),
                source: Some(spec.source_name.clone()),
                read_only: false,
                primary: false,
            };
            let content = toml::to_string(&meta).map_err(|e| {
                warn!(error = %e, "Failed to serialize calendar metadata");
                ProviderError::internal(e.to_string()).with_provider(PROVIDER_NAME)
            })?;
            write_atomic(&dir.join(CALENDAR_META_FILE), &content).await?;

            info!(id = %id, title = %spec.title, "Created local calendar");
            Ok(id)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calsync_core::TimeWindow;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn utc(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, d, h, 0, 0).unwrap()
    }

    fn entry(title: &str) -> CalendarEntryData {
        CalendarEntryData {
            title: title.to_string(),
            start: utc(15, 9),
            end: utc(15, 9) + Duration::hours(8),
            location: Some("Online via Zoom".to_string()),
            notes: "📝 Talks".to_string(),
        }
    }

    fn add_calendar(root: &Path, id: &str, meta: &str) {
        std::fs::create_dir_all(root.join(id)).unwrap();
        std::fs::write(root.join(id).join(CALENDAR_META_FILE), meta).unwrap();
    }

    #[tokio::test]
    async fn missing_root_has_no_calendars() {
        let dir = tempfile::tempdir().unwrap();
        let provider = LocalProvider::new(LocalConfig::new(dir.path().join("nope")));
        assert!(provider.list_calendars().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn lists_calendars_sorted() {
        let dir = tempfile::tempdir().unwrap();
        add_calendar(dir.path(), "work", "title = \"Work\"\nread_only = true\n");
        add_calendar(dir.path(), "personal", "title = \"Personal\"\nsource = \"iCloud\"\n");
        std::fs::write(dir.path().join("stray.txt"), "ignored").unwrap();

        let provider = LocalProvider::new(LocalConfig::new(dir.path()));
        let calendars = provider.list_calendars().await.unwrap();
        assert_eq!(calendars.len(), 2);
        assert_eq!(calendars[0].id, "personal");
        assert_eq!(calendars[0].source(), "iCloud");
        assert!(!calendars[1].writable);
    }

    #[tokio::test]
    async fn create_and_fetch_entry() {
        let dir = tempfile::tempdir().unwrap();
        add_calendar(dir.path(), "personal", "");
        let provider = LocalProvider::new(LocalConfig::new(dir.path()));

        let uid = provider
            .create_event("personal", &entry("🎉 Tech Conference 2025"))
            .await
            .unwrap();
        assert!(dir.path().join("personal").join(format!("{}.ics", uid)).exists());

        let day = TimeWindow::new(utc(15, 0), utc(16, 0));
        let found = provider.fetch_events(FetchOptions::new(day)).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, uid);
        assert_eq!(found[0].calendar_id, "personal");
        assert_eq!(found[0].title, "🎉 Tech Conference 2025");

        let next_day = TimeWindow::new(utc(16, 0), utc(17, 0));
        assert!(provider.fetch_events(FetchOptions::new(next_day)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_read_only_and_missing_calendars() {
        let dir = tempfile::tempdir().unwrap();
        add_calendar(dir.path(), "holidays", "read_only = true\n");
        let provider = LocalProvider::new(LocalConfig::new(dir.path()));

        assert!(provider.create_event("holidays", &entry("x")).await.is_err());
        assert!(provider.create_event("ghost", &entry("x")).await.is_err());
    }

    #[tokio::test]
    async fn calendar_creation() {
        let dir = tempfile::tempdir().unwrap();
        let forbidden = LocalProvider::new(LocalConfig::new(dir.path()));
        assert!(forbidden.create_calendar(&NewCalendar::local_events()).await.is_err());

        let provider =
            LocalProvider::new(LocalConfig::new(dir.path()).with_calendar_creation(true));
        let first = provider.create_calendar(&NewCalendar::local_events()).await.unwrap();
        let second = provider.create_calendar(&NewCalendar::local_events()).await.unwrap();
        assert_eq!(first, "events");
        assert_eq!(second, "events-2");

        let calendars = provider.list_calendars().await.unwrap();
        assert_eq!(calendars.len(), 2);
        assert_eq!(calendars[0].title, "Events");
        assert_eq!(calendars[0].source(), "Local Calendar");
    }

    #[tokio::test]
    async fn access_follows_config() {
        let dir = tempfile::tempdir().unwrap();
        let provider =
            LocalProvider::new(LocalConfig::new(dir.path()).with_access(AccessStatus::Denied));
        assert_eq!(provider.request_access().await.unwrap(), AccessStatus::Denied);
    }

    #[test]
    fn slugify_titles() {
        assert_eq!(slugify("Events"), "events");
        assert_eq!(slugify("My  Work / Team"), "my-work-team");
        assert_eq!(slugify("🎉"), "calendar");
    }
}
