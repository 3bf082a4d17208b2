use std::io::{self, Write};

use super::config::{OutputConfig, OutputFormat};
use super::types::Envelope;

/// Human-readable rendering of a plan or result body.
pub trait Render {
    fn render_text(&self, w: &mut dyn Write) -> io::Result<()>;
}

pub trait Presenter: Send + Sync {
    fn emit(&self, env: &Envelope, body: &dyn Render, w: &mut dyn Write) -> io::Result<()>;
}

pub struct JsonPresenter { pub pretty: bool }
impl Presenter for JsonPresenter {
    fn emit(&self, env: &Envelope, _body: &dyn Render, w: &mut dyn Write) -> io::Result<()> {
        if self.pretty { serde_json::to_writer_pretty(&mut *w, env).map_err(to_io)? } else { serde_json::to_writer(&mut *w, env).map_err(to_io)? }
        writeln!(w)
    }
}

pub struct TextPresenter;
impl Presenter for TextPresenter {
    fn emit(&self, _env: &Envelope, body: &dyn Render, w: &mut dyn Write) -> io::Result<()> {
        body.render_text(w)
    }
}

pub struct Emitter {
    presenter: Box<dyn Presenter>,
}

impl Emitter {
    pub fn from_config(cfg: OutputConfig) -> Self {
        let presenter: Box<dyn Presenter> = match cfg.format {
            OutputFormat::Json => Box::new(JsonPresenter { pretty: cfg.pretty }),
            OutputFormat::Text => Box::new(TextPresenter),
        };
        Emitter { presenter }
    }

    pub fn emit(&self, env: &Envelope, body: &dyn Render) -> io::Result<()> {
        let mut out = io::stdout().lock();
        self.emit_to(env, body, &mut out)?;
        out.flush()
    }

    pub fn emit_to(&self, env: &Envelope, body: &dyn Render, w: &mut dyn Write) -> io::Result<()> {
        self.presenter.emit(env, body, w)
    }
}

fn to_io(e: serde_json::Error) -> io::Error { io::Error::new(io::ErrorKind::Other, e) }
