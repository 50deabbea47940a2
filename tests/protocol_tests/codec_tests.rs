//! Codec Tests
//!
//! Tests for command parsing, frame encoding and console responses.

use meshgate::error::{GatewayError, ParseError, ValidationError};
use meshgate::protocol::{
    encode_frame, parse_command, CommandType, MeshCommand, Response, Status, BOARD_FRAME_LEN,
    BOARD_TOKEN_WIDTH, ORDER_FRAME_LEN, ORDER_TOKEN_WIDTH, SERIAL_MESH_CMD,
};

// =============================================================================
// Parsing Tests
// =============================================================================

#[test]
fn test_parse_order_command() {
    let cmd = parse_command("C6O1A2B").unwrap();
    assert_eq!(cmd, MeshCommand::Order { code: 6, order: 0x1A2B });
    assert_eq!(cmd.command_type(), CommandType::Order);
}

#[test]
fn test_parse_board_command_with_leading_zeros() {
    let cmd = parse_command("C3B007").unwrap();
    assert_eq!(cmd, MeshCommand::Board { code: 3, board: 7 });
    assert_eq!(cmd.code(), 3);
}

#[test]
fn test_parse_ignores_whitespace_and_nul_padding() {
    assert_eq!(
        parse_command("  C1B255\r\n\0\0").unwrap(),
        MeshCommand::Board { code: 1, board: 255 }
    );
}

#[test]
fn test_parse_order_lowercase_hex() {
    assert_eq!(
        parse_command("C6Offff").unwrap(),
        MeshCommand::Order { code: 6, order: 0xFFFF }
    );
}

#[test]
fn test_parse_missing_discriminator() {
    let err = parse_command("C6").unwrap_err();
    assert!(matches!(err, GatewayError::Parse(ParseError::MissingDiscriminator)));
}

#[test]
fn test_parse_unknown_discriminator() {
    let err = parse_command("C6X12").unwrap_err();
    assert!(matches!(err, GatewayError::Parse(ParseError::UnknownDiscriminator('X'))));
}

#[test]
fn test_parse_non_numeric_code() {
    let err = parse_command("CxB1").unwrap_err();
    assert!(matches!(err, GatewayError::Parse(ParseError::InvalidCode('x'))));
}

#[test]
fn test_parse_missing_prefix() {
    let err = parse_command("D3B1").unwrap_err();
    assert!(matches!(err, GatewayError::Parse(ParseError::MissingPrefix('D'))));
}

#[test]
fn test_parse_non_hex_order() {
    let err = parse_command("C6OXYZ").unwrap_err();
    assert!(matches!(
        err,
        GatewayError::Parse(ParseError::InvalidToken { field: "order", found: 'X' })
    ));
}

#[test]
fn test_parse_board_rejects_hex_digits() {
    assert!(matches!(
        parse_command("C3B1F").unwrap_err(),
        GatewayError::Parse(ParseError::InvalidToken { .. })
    ));
}

#[test]
fn test_parse_out_of_range_values() {
    assert!(matches!(
        parse_command("C3B256").unwrap_err(),
        GatewayError::Validation(ValidationError::OutOfRange { .. })
    ));
}

#[test]
fn test_parse_order_token_wider_than_four_digits() {
    for text in ["C6O12345", "C6O01A2B", "C6O00001A2B"] {
        let err = parse_command(text).unwrap_err();
        assert!(
            matches!(
                err,
                GatewayError::Validation(ValidationError::TooLong {
                    field: "order",
                    max: ORDER_TOKEN_WIDTH,
                    ..
                })
            ),
            "{} gave {:?}",
            text,
            err
        );
    }
}

#[test]
fn test_parse_board_token_wider_than_three_digits() {
    for text in ["C3B0007", "C3B0000007", "C3B1000"] {
        let err = parse_command(text).unwrap_err();
        assert!(
            matches!(
                err,
                GatewayError::Validation(ValidationError::TooLong {
                    field: "board",
                    max: BOARD_TOKEN_WIDTH,
                    ..
                })
            ),
            "{} gave {:?}",
            text,
            err
        );
    }
}

#[test]
fn test_parse_tokens_at_full_width() {
    assert_eq!(
        parse_command("C6O000A").unwrap(),
        MeshCommand::Order { code: 6, order: 0x000A }
    );
    assert_eq!(
        parse_command("C3B000").unwrap(),
        MeshCommand::Board { code: 3, board: 0 }
    );
}

#[test]
fn test_parse_empty_and_missing_token() {
    assert!(matches!(parse_command("").unwrap_err(), GatewayError::Parse(ParseError::Empty)));
    assert!(matches!(
        parse_command("C3B").unwrap_err(),
        GatewayError::Parse(ParseError::MissingToken("board"))
    ));
}

// =============================================================================
// Encoding Tests
// =============================================================================

#[test]
fn test_encode_order_frame() {
    let frame = encode_frame(&MeshCommand::Order { code: 6, order: 0x1A2B });
    assert_eq!(frame.as_bytes(), &[0x04, SERIAL_MESH_CMD, 0x06, 0x1A, 0x2B]);
    assert_eq!(frame.len(), ORDER_FRAME_LEN);
    assert_eq!(frame.to_hex(), "04 20 06 1A 2B");
}

#[test]
fn test_encode_board_frame() {
    let frame = encode_frame(&MeshCommand::Board { code: 3, board: 7 });
    assert_eq!(frame.as_bytes(), &[0x03, SERIAL_MESH_CMD, 0x03, 0x07]);
    assert_eq!(frame.len(), BOARD_FRAME_LEN);
}

#[test]
fn test_length_byte_counts_rest_of_frame() {
    for text in ["C0O0", "C9OFFFF", "C0B0", "C9B255", "C6O1A2B"] {
        let frame = encode_frame(&parse_command(text).unwrap());
        let bytes = frame.as_bytes();
        assert_eq!(bytes[0] as usize, bytes.len() - 1, "frame for {}", text);
        assert_eq!(bytes[1], SERIAL_MESH_CMD);
    }
}

// =============================================================================
// Response Tests
// =============================================================================

#[test]
fn test_response_from_ok_result() {
    let response = Response::from_result(Ok(None));
    assert_eq!(response.status, Status::Ok);
    assert!(response.is_ok());
    assert_eq!(response.render(), "OK");

    let response = Response::from_result(Ok(Some("1".to_string())));
    assert_eq!(response.render(), "1");
}

#[test]
fn test_response_bad_args_for_parse_errors() {
    let response = Response::from_result(Err(parse_command("C6").unwrap_err()));
    assert_eq!(response.status, Status::BadArgs);
    assert!(!response.is_ok());
    assert!(response.render().starts_with("BAD ARGS: "));
}

#[test]
fn test_response_error_for_not_connected() {
    let response = Response::from_result(Err(GatewayError::NotConnected));
    assert_eq!(response.status, Status::Error);
    assert_eq!(response.render(), "ERROR: Not connected to broker");
}
