// src/nuget/descriptor.rs
//! NuGet package descriptor (.nuspec)
//!
//! A descriptor is built once per packaging run through [`DescriptorBuilder`],
//! validated at `build()` and read-only afterwards. Serialization produces a
//! fixed layout (2013/05 schema, four-space indentation, no XML declaration)
//! so the output can be compared byte-for-byte.

use crate::error::{Error, Result};
use quick_xml::escape::escape;
use strum_macros::{Display, EnumString};

/// XML namespace of the nuspec schema
pub const NUSPEC_NAMESPACE: &str = "http://schemas.microsoft.com/packaging/2013/05/nuspec.xsd";

/// A package dependency, `version` is a NuGet version range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub id: String,
    pub version: Option<String>,
}

impl Dependency {
    pub fn new(id: &str, version: Option<&str>) -> Self {
        Self {
            id: id.to_string(),
            version: version.map(str::to_string),
        }
    }

    /// Parse `id` or `id:version`
    pub fn parse(spec: &str) -> Option<Self> {
        let (id, version) = match spec.split_once(':') {
            Some((id, version)) => (id.trim(), Some(version.trim())),
            None => (spec.trim(), None),
        };
        if id.is_empty() {
            return None;
        }
        Some(Self::new(id, version.filter(|v| !v.is_empty())))
    }
}

/// How the `<license>` element identifies the license
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LicenseKind {
    /// SPDX expression, e.g. `MIT OR Apache-2.0`
    #[default]
    Expression,
    /// Path of a license file inside the package
    File,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct License {
    pub kind: LicenseKind,
    pub value: String,
}

impl License {
    pub fn expression(value: &str) -> Self {
        Self {
            kind: LicenseKind::Expression,
            value: value.to_string(),
        }
    }

    pub fn file(path: &str) -> Self {
        Self {
            kind: LicenseKind::File,
            value: path.to_string(),
        }
    }
}

/// Package ids are used as file names, so only NuGet's id alphabet is allowed
fn validate_id(id: &str) -> Result<()> {
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-');
    if !id.chars().all(allowed) || id.contains("..") || id.starts_with('.') {
        return Err(Error::validation(format!(
            "invalid package id '{}': use letters, digits, '.', '_' and '-'",
            id
        )));
    }
    Ok(())
}

/// Validated package metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDescriptor {
    id: String,
    version: String,
    title: Option<String>,
    authors: Vec<String>,
    owners: Vec<String>,
    license_url: Option<String>,
    project_url: Option<String>,
    icon_url: Option<String>,
    require_license_acceptance: Option<bool>,
    description: Option<String>,
    summary: Option<String>,
    release_notes: Option<String>,
    copyright: Option<String>,
    tags: Vec<String>,
    icon: Option<String>,
    license: Option<License>,
    dependencies: Vec<Dependency>,
}

impl PackageDescriptor {
    pub fn builder() -> DescriptorBuilder {
        DescriptorBuilder::default()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn license(&self) -> Option<&License> {
        self.license.as_ref()
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// File name the descriptor is written under
    pub fn file_name(&self) -> String {
        format!("{}.nuspec", self.id)
    }

    /// File name NuGet gives the packed artifact
    pub fn package_file_name(&self) -> String {
        format!("{}.{}.nupkg", self.id, self.version)
    }

    /// Serialize to the nuspec XML document
    pub fn to_nuspec(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "<package xmlns:mstns=\"{ns}\" xmlns:None=\"{ns}\" >\n",
            ns = NUSPEC_NAMESPACE
        ));
        out.push_str("    <metadata>\n");

        element(&mut out, "id", Some(&self.id));
        element(&mut out, "version", Some(&self.version));
        element(&mut out, "title", self.title.as_deref());
        element(&mut out, "authors", joined(&self.authors, ", ").as_deref());
        element(&mut out, "owners", joined(&self.owners, ", ").as_deref());
        element(&mut out, "licenseUrl", self.license_url.as_deref());
        element(&mut out, "projectUrl", self.project_url.as_deref());
        element(&mut out, "iconUrl", self.icon_url.as_deref());
        element(
            &mut out,
            "requireLicenseAcceptance",
            self.require_license_acceptance
                .map(|b| if b { "true" } else { "false" }),
        );
        element(&mut out, "description", self.description.as_deref());
        element(&mut out, "summary", self.summary.as_deref());
        element(&mut out, "releaseNotes", self.release_notes.as_deref());
        element(&mut out, "copyright", self.copyright.as_deref());
        element(&mut out, "tags", joined(&self.tags, " ").as_deref());
        element(&mut out, "icon", self.icon.as_deref());

        if let Some(license) = &self.license {
            out.push_str(&format!(
                "        <license type=\"{}\">{}</license>\n",
                license.kind,
                escape(license.value.as_str())
            ));
        }

        if !self.dependencies.is_empty() {
            out.push_str("        <dependencies>\n");
            for dep in &self.dependencies {
                match &dep.version {
                    Some(version) => out.push_str(&format!(
                        "            <dependency id=\"{}\" version=\"{}\"/>\n",
                        escape(dep.id.as_str()),
                        escape(version.as_str())
                    )),
                    None => out.push_str(&format!(
                        "            <dependency id=\"{}\"/>\n",
                        escape(dep.id.as_str())
                    )),
                }
            }
            out.push_str("        </dependencies>\n");
        }

        out.push_str("    </metadata>\n");
        out.push_str("</package>\n");
        out
    }
}

fn element(out: &mut String, name: &str, value: Option<&str>) {
    if let Some(value) = value {
        out.push_str(&format!("        <{name}>{}</{name}>\n", escape(value)));
    }
}

fn joined(values: &[String], separator: &str) -> Option<String> {
    if values.is_empty() {
        None
    } else {
        Some(values.join(separator))
    }
}

/// Collects descriptor fields; empty and whitespace-only values are ignored
#[derive(Debug, Clone, Default)]
pub struct DescriptorBuilder {
    id: Option<String>,
    version: Option<String>,
    title: Option<String>,
    authors: Vec<String>,
    owners: Vec<String>,
    license_url: Option<String>,
    project_url: Option<String>,
    icon_url: Option<String>,
    require_license_acceptance: Option<bool>,
    description: Option<String>,
    summary: Option<String>,
    release_notes: Option<String>,
    copyright: Option<String>,
    tags: Vec<String>,
    icon: Option<String>,
    license: Option<License>,
    dependencies: Vec<Dependency>,
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl DescriptorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = non_empty(id);
        self
    }

    pub fn version(mut self, version: &str) -> Self {
        self.version = non_empty(version);
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = non_empty(title);
        self
    }

    pub fn author(mut self, author: &str) -> Self {
        self.authors.extend(non_empty(author));
        self
    }

    pub fn authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.authors
            .extend(authors.into_iter().filter_map(|a| non_empty(a.as_ref())));
        self
    }

    pub fn owner(mut self, owner: &str) -> Self {
        self.owners.extend(non_empty(owner));
        self
    }

    pub fn owners<I, S>(mut self, owners: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.owners
            .extend(owners.into_iter().filter_map(|o| non_empty(o.as_ref())));
        self
    }

    pub fn license_url(mut self, url: &str) -> Self {
        self.license_url = non_empty(url);
        self
    }

    pub fn project_url(mut self, url: &str) -> Self {
        self.project_url = non_empty(url);
        self
    }

    pub fn icon_url(mut self, url: &str) -> Self {
        self.icon_url = non_empty(url);
        self
    }

    pub fn require_license_acceptance(mut self, required: bool) -> Self {
        self.require_license_acceptance = Some(required);
        self
    }

    /// Description text is kept verbatim apart from surrounding whitespace
    pub fn description(mut self, description: &str) -> Self {
        self.description = non_empty(description);
        self
    }

    pub fn summary(mut self, summary: &str) -> Self {
        self.summary = non_empty(summary);
        self
    }

    pub fn release_notes(mut self, notes: &str) -> Self {
        self.release_notes = non_empty(notes);
        self
    }

    pub fn copyright(mut self, copyright: &str) -> Self {
        self.copyright = non_empty(copyright);
        self
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.tags.extend(non_empty(tag));
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags
            .extend(tags.into_iter().filter_map(|t| non_empty(t.as_ref())));
        self
    }

    /// Path of an icon file inside the package
    pub fn icon(mut self, icon: &str) -> Self {
        self.icon = non_empty(icon);
        self
    }

    pub fn license(mut self, license: License) -> Self {
        self.license = non_empty(&license.value).map(|value| License {
            kind: license.kind,
            value,
        });
        self
    }

    pub fn dependency(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Validate and freeze the descriptor
    pub fn build(self) -> Result<PackageDescriptor> {
        let id = self
            .id
            .ok_or_else(|| Error::validation("package descriptor requires an id"))?;
        validate_id(&id)?;
        let version = self
            .version
            .ok_or_else(|| Error::validation("package descriptor requires a version"))?;
        if self.authors.is_empty() && self.owners.is_empty() {
            return Err(Error::validation(
                "package descriptor requires at least one of authors/owners",
            ));
        }

        Ok(PackageDescriptor {
            id,
            version,
            title: self.title,
            authors: self.authors,
            owners: self.owners,
            license_url: self.license_url,
            project_url: self.project_url,
            icon_url: self.icon_url,
            require_license_acceptance: self.require_license_acceptance,
            description: self.description,
            summary: self.summary,
            release_notes: self.release_notes,
            copyright: self.copyright,
            tags: self.tags,
            icon: self.icon,
            license: self.license,
            dependencies: self.dependencies,
        })
    }
}
