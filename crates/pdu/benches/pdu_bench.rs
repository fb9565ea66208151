use std::hint::black_box;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::BytesMut;
use criterion::{Criterion, criterion_group, criterion_main};
use micro_pdu::config::PduConfig;
use micro_pdu::content_type::{AcceptList, ContentType};
use micro_pdu::header::try_parse_header;
use micro_pdu::pdu::{Pdu, PduBuilder, PduKind, TypedHeaders, acquire_body_async};
use micro_pdu::status::StatusCode;
use tokio::io::{AsyncRead, ReadBuf};
use tracing::Level;

const REQUEST: &str = "GET /api/users/42?fields=name HTTP/1.1\r\n\
Host: localhost:8080\r\n\
User-Agent: Mozilla/5.0 (X11; Linux x86_64)\r\n\
Accept: text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8\r\n\
Accept-Encoding: gzip, deflate, br\r\n\
Cookie: Session=abc:Path=/:Secure; theme=dark\r\n\
Connection: keep-alive\r\n\
Content-Length: 0\r\n\r\n";

// Mock IO serving a fixed payload in small chunks
struct MockIO {
    read_data: Vec<u8>,
    read_pos: usize,
    chunk: usize,
}

impl MockIO {
    fn new(read_data: Vec<u8>, chunk: usize) -> Self {
        Self { read_data, read_pos: 0, chunk }
    }
}

impl AsyncRead for MockIO {
    fn poll_read(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        let remaining = &self.read_data[self.read_pos..];
        let amt = remaining.len().min(buf.remaining()).min(self.chunk);
        buf.put_slice(&remaining[..amt]);
        self.read_pos += amt;
        Poll::Ready(Ok(()))
    }
}

fn bench_parse_header(c: &mut Criterion) {
    c.bench_function("parse_header_block", |b| {
        b.iter(|| black_box(try_parse_header(black_box(REQUEST), PduKind::Request).unwrap()));
    });

    c.bench_function("parse_and_read_typed", |b| {
        b.iter(|| {
            let mut pdu = Pdu::parse_request(black_box(REQUEST));
            black_box((pdu.host(), pdu.accept(), pdu.cookies(), pdu.content_length()));
        });
    });
}

fn bench_negotiate(c: &mut Criterion) {
    let accept = AcceptList::parse("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8");
    let offered = [ContentType::json(), ContentType::xml(), ContentType::html()];

    c.bench_function("negotiate", |b| {
        b.iter(|| black_box(accept.negotiate(black_box(&offered))));
    });

    c.bench_function("parse_content_type", |b| {
        b.iter(|| black_box(ContentType::parse(black_box("application/json; charset=utf-8"))));
    });
}

fn bench_build_response(c: &mut Criterion) {
    c.bench_function("build_response", |b| {
        b.iter(|| {
            let mut builder = PduBuilder::response(StatusCode::OK);
            builder.set_content_type(ContentType::json());
            builder.set_content(r#"{"name":"micro"}"#);
            let pdu = builder.build().unwrap();

            let mut dst = BytesMut::new();
            pdu.encode_head(&mut dst);
            black_box(dst);
        });
    });
}

fn bench_acquire_body(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap();
    let config = PduConfig::default().with_read_idle_wait(Duration::ZERO);
    let payload = vec![b'x'; 64 * 1024];

    c.bench_function("acquire_body_async_64k", |b| {
        b.iter(|| {
            let mut io = MockIO::new(payload.clone(), 4096);
            let body = runtime.block_on(acquire_body_async(&mut io, payload.len() as u64, &config, None)).unwrap();
            black_box(body);
        });
    });
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_max_level(Level::WARN).try_init();
}

fn benches(c: &mut Criterion) {
    init_tracing();
    bench_parse_header(c);
    bench_negotiate(c);
    bench_build_response(c);
    bench_acquire_body(c);
}

criterion_group!(pdu_benches, benches);
criterion_main!(pdu_benches);
