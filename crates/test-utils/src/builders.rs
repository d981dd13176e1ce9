#![allow(dead_code)]

use assetwatch::config::{load_from_str, ConfigFile, RawConfigFile};

/// Builder for config TOML text, to keep test setup readable.
///
/// Paths default to a conventional front-end layout:
/// `assets/{scripts,styles,images/sprite}` compiled into `www/assets/...`.
pub struct ConfigBuilder {
    proxy: Option<String>,
    src: String,
    dest: String,
    views: Option<String>,
    extra_paths: Vec<(String, String)>,
    scripts_cmd: Option<String>,
    styles_cmd: Option<String>,
    svgs: Option<SvgSetup>,
    concat_entries: Vec<(Vec<String>, String)>,
    concat_cmd: Option<String>,
    concat_reload: Option<String>,
}

enum SvgSetup {
    Sprite(String),
    Cmd(String),
}

fn quote(s: &str) -> String {
    format!("{s:?}")
}

fn quote_list(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|s| quote(s)).collect();
    format!("[{}]", quoted.join(", "))
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            proxy: None,
            src: "assets".to_string(),
            dest: "www".to_string(),
            views: None,
            extra_paths: Vec::new(),
            scripts_cmd: None,
            styles_cmd: None,
            svgs: None,
            concat_entries: Vec::new(),
            concat_cmd: None,
            concat_reload: None,
        }
    }

    pub fn proxy(mut self, url: &str) -> Self {
        self.proxy = Some(url.to_string());
        self
    }

    pub fn views(mut self, pattern: &str) -> Self {
        self.views = Some(pattern.to_string());
        self
    }

    pub fn path(mut self, key: &str, value: &str) -> Self {
        self.extra_paths.push((key.to_string(), value.to_string()));
        self
    }

    pub fn scripts(mut self, cmd: &str) -> Self {
        self.scripts_cmd = Some(cmd.to_string());
        self
    }

    pub fn styles(mut self, cmd: &str) -> Self {
        self.styles_cmd = Some(cmd.to_string());
        self
    }

    pub fn sprite(mut self, name: &str) -> Self {
        self.svgs = Some(SvgSetup::Sprite(name.to_string()));
        self
    }

    pub fn svgs_cmd(mut self, cmd: &str) -> Self {
        self.svgs = Some(SvgSetup::Cmd(cmd.to_string()));
        self
    }

    pub fn concat(mut self, includes: &[&str], outfile: &str) -> Self {
        self.concat_entries.push((
            includes.iter().map(|s| s.to_string()).collect(),
            outfile.to_string(),
        ));
        self
    }

    pub fn concat_cmd(mut self, cmd: &str) -> Self {
        self.concat_cmd = Some(cmd.to_string());
        self
    }

    pub fn concat_reload(mut self, policy: &str) -> Self {
        self.concat_reload = Some(policy.to_string());
        self
    }

    pub fn to_toml(&self) -> String {
        let mut out = String::new();

        if let Some(proxy) = &self.proxy {
            out.push_str(&format!("[server]\nproxy = {}\n\n", quote(proxy)));
        }

        out.push_str("[paths]\n");
        out.push_str(&format!("src = {}\n", quote(&self.src)));
        out.push_str(&format!("dest = {}\n", quote(&self.dest)));
        if let Some(views) = &self.views {
            out.push_str(&format!("views.src = {}\n", quote(views)));
        }
        for (key, value) in &self.extra_paths {
            out.push_str(&format!("{key} = {}\n", quote(value)));
        }
        let sd = [
            ("scripts", "scripts"),
            ("styles", "styles"),
            ("svgs", "images/sprite"),
        ];
        for (name, dir) in sd {
            out.push_str(&format!(
                "{name} = {{ src = {}, dest = {} }}\n",
                quote(&format!("{}/{dir}", self.src)),
                quote(&format!("{}/assets/{dir}", self.dest)),
            ));
        }
        out.push('\n');

        if let Some(policy) = &self.concat_reload {
            out.push_str(&format!("[reload]\nconcats = {}\n\n", quote(policy)));
        }

        if let Some(cmd) = &self.scripts_cmd {
            out.push_str(&format!("[tasks.scripts]\ncmd = {}\n\n", quote(cmd)));
        }
        if let Some(cmd) = &self.styles_cmd {
            out.push_str(&format!("[tasks.styles]\ncmd = {}\n\n", quote(cmd)));
        }
        match &self.svgs {
            Some(SvgSetup::Sprite(name)) => {
                out.push_str(&format!("[tasks.svgs]\nsprite = {}\n\n", quote(name)));
            }
            Some(SvgSetup::Cmd(cmd)) => {
                out.push_str(&format!("[tasks.svgs]\ncmd = {}\n\n", quote(cmd)));
            }
            None => {}
        }

        if self.concat_cmd.is_some() || !self.concat_entries.is_empty() {
            out.push_str("[tasks.concats]\n");
            if let Some(cmd) = &self.concat_cmd {
                out.push_str(&format!("cmd = {}\n", quote(cmd)));
            }
            out.push('\n');
            for (includes, outfile) in &self.concat_entries {
                out.push_str("[[tasks.concats.entries]]\n");
                out.push_str(&format!("includes = {}\n", quote_list(includes)));
                out.push_str(&format!("outfile = {}\n\n", quote(outfile)));
            }
        }

        out
    }

    pub fn raw(&self) -> RawConfigFile {
        load_from_str(&self.to_toml()).expect("builder produced unparsable TOML")
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.raw()).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
