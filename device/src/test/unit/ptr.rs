use crate::DevicePtr;

#[test]
fn test_offset() {
    let ptr = DevicePtr::new(0x1000);
    assert_eq!(ptr.offset(0x20), DevicePtr::new(0x1020));
    assert_eq!(DevicePtr::new(u64::MAX - 1).offset(1).addr(), u64::MAX);
}

#[test]
#[should_panic(expected = "overflows the address space")]
fn test_offset_overflow_panics() {
    let _ = DevicePtr::new(u64::MAX).offset(1);
}

#[test]
fn test_display() {
    assert_eq!(DevicePtr::new(0xff).to_string(), "0xff");
    assert_eq!(format!("{:?}", DevicePtr::NULL), "DevicePtr(0x0)");
    assert!(DevicePtr::NULL.is_null());
}
