//! Process-wide stream byte order. Kept in its own test binary because it
//! changes global state.

use pixelworks::config::{channel_order, set_channel_order};
use pixelworks::{parallel, ChannelOrder, EngineConfig, PixelU8, RasterBuffer};

#[test]
fn test_configured_order_drives_stream_import_and_export() {
    let config = EngineConfig::from_lookup(|key| match key {
        "PIXELWORKS_CHANNEL_ORDER" => Some("bgra".to_string()),
        _ => None,
    })
    .unwrap();
    parallel::configure(&config).unwrap();
    assert_eq!(channel_order(), ChannelOrder::Bgra);

    let mut buffer = RasterBuffer::from_stream(2, 1, vec![10, 20, 30, 40, 1, 2, 3, 4]).unwrap();
    assert_eq!(buffer.pixels()[0], PixelU8::new(30, 20, 10, 40));
    assert_eq!(buffer.pixels()[1], PixelU8::new(3, 2, 1, 4));
    assert_eq!(buffer.to_stream(), vec![10, 20, 30, 40, 1, 2, 3, 4]);
    assert_eq!(buffer.to_bytes(ChannelOrder::Rgba), vec![30, 20, 10, 40, 3, 2, 1, 4]);

    set_channel_order(ChannelOrder::Rgba);
    let mut buffer = RasterBuffer::from_stream(1, 1, vec![10, 20, 30, 40]).unwrap();
    assert_eq!(buffer.pixels()[0], PixelU8::new(10, 20, 30, 40));
}
