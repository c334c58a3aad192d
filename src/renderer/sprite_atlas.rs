use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::renderer::atlas::{AtlasSet, TextureAtlas};
use crate::renderer::RenderContext;
use crate::sprite::{SpriteDefinition, SpriteSheet};

// ── Discovery (pure, no I/O) ─────────────────────────────────────────────────

/// Keep the first definition seen for each file stem.
///
/// Paths without a usable stem are dropped.  The returned order follows the
/// input order, so callers sort beforehand for deterministic results.
pub(crate) fn dedupe_by_stem(paths: &[PathBuf]) -> Vec<(String, PathBuf)> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();

    for path in paths {
        let name = match path.file_stem().and_then(|s| s.to_str()) {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => continue,
        };
        if !seen.insert(name.clone()) {
            warn!("sprite library: duplicate name '{name}' from {}; skipping", path.display());
            continue;
        }
        out.push((name, path.clone()));
    }
    out
}

/// Resolve a definition's `sheet` entry against the directory holding it.
pub(crate) fn sheet_path(definition_path: &Path, sheet: &str) -> PathBuf {
    match definition_path.parent() {
        Some(dir) => dir.join(sheet),
        None => PathBuf::from(sheet),
    }
}

// ── SpriteLibrary ────────────────────────────────────────────────────────────

/// Named sprite sheets sharing one growable set of atlases.
pub struct SpriteLibrary {
    sheets: HashMap<String, Rc<SpriteSheet>>,
    atlases: AtlasSet,
}

impl SpriteLibrary {
    pub fn new(atlas_size: u32) -> Self {
        Self { sheets: HashMap::new(), atlases: AtlasSet::new(atlas_size) }
    }

    /// Atlases are uploaded as `TextureId(base + index)`.
    pub fn with_texture_base(mut self, base: u32) -> Self {
        self.atlases = self.atlases.with_texture_base(base);
        self
    }

    /// Scan `path` recursively for `*.json` sprite definitions and pack
    /// every sheet they reference.
    ///
    /// Unreadable definitions and sheets are skipped with a warning; one
    /// broken file never prevents the rest of the folder from loading.
    pub fn load_folder(path: impl AsRef<Path>, atlas_size: u32) -> Self {
        let mut library = Self::new(atlas_size);
        library.add_folder(path);
        library
    }

    /// Add every definition below `path`.  Returns how many sheets were added.
    pub fn add_folder(&mut self, path: impl AsRef<Path>) -> usize {
        let path = path.as_ref();
        let mut found: Vec<PathBuf> = walkdir::WalkDir::new(path)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("json"))
            .collect();
        found.sort();

        let mut added = 0;
        for (name, file) in dedupe_by_stem(&found) {
            if self.sheets.contains_key(&name) {
                warn!("sprite library: '{name}' already loaded; skipping {}", file.display());
                continue;
            }
            match self.load_file(&name, &file) {
                Ok(()) => added += 1,
                Err(e) => warn!("sprite library: failed to load {}: {e}", file.display()),
            }
        }

        info!(
            "sprite library: {added} sheet(s) from {} packed into {} atlas(es)",
            path.display(),
            self.atlases.len()
        );
        added
    }

    /// Load one definition file and the sheet image it names.
    pub fn load_file(&mut self, name: &str, file: &Path) -> Result<()> {
        let text = fs::read_to_string(file).map_err(|e| Error::io(file, e))?;
        let definition = SpriteDefinition::from_json(&text)?;
        let image = image::open(sheet_path(file, &definition.sheet))?.to_rgba8();
        self.insert(name, &definition, &image)
    }

    /// Pack an already-decoded definition and sheet under `name`.
    pub fn insert(&mut self, name: &str, definition: &SpriteDefinition, sheet: &image::RgbaImage) -> Result<()> {
        let sheet = SpriteSheet::from_definition(name, definition, sheet, &mut self.atlases)?;
        self.sheets.insert(name.to_string(), Rc::new(sheet));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Rc<SpriteSheet>> {
        self.sheets.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sheets.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sheets.keys().map(String::as_str)
    }

    pub fn atlases(&self) -> &[TextureAtlas] {
        self.atlases.atlases()
    }

    /// Push freshly packed atlas pixels to the backend.
    pub fn upload_dirty(&mut self, ctx: &mut RenderContext<'_>) {
        self.atlases.upload_dirty(ctx);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
