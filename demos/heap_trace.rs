use rfirstfit::{Handle, Heap, HeapConfig, HeapError};

/// One-line summary of how the arena is carved up.
fn print_usage(
  label: &str,
  heap: &Heap,
) {
  let stats = heap.stats();
  println!(
    "[{}] {} used, {} free ({} largest) in {} block(s), {} header bytes, capacity {}",
    label,
    stats.used_bytes,
    stats.free_bytes,
    stats.largest_free,
    stats.block_count,
    stats.overhead_bytes(),
    stats.capacity,
  );
}

fn print_heap(heap: &Heap) {
  println!("{}\n", heap);
}

fn store(
  heap: &mut Heap,
  handle: Handle,
  bytes: &[u8],
) -> Result<(), HeapError> {
  heap.payload_mut(handle)?.copy_from_slice(bytes);
  Ok(())
}

fn release(
  heap: &mut Heap,
  handle: Handle,
  label: &str,
) {
  match heap.free(handle) {
    Ok(()) => println!("{} memory freed", label),
    Err(err) => println!("{}", err),
  }
  print_heap(heap);
}

fn main() -> Result<(), HeapError> {
  env_logger::init();

  // RFIRSTFIT_CAPACITY overrides the 1 KB default.
  let mut heap = Heap::with_config(&HeapConfig::from_env())?;
  println!("Initialized heap.");
  print_usage("start", &heap);
  print_heap(&heap);

  // --------------------------------------------------------------------
  // 1) A char, an int and a float, in that order.
  // --------------------------------------------------------------------
  let char_ptr = heap.allocate(size_of::<u8>())?;
  store(&mut heap, char_ptr, b"A")?;
  println!("Allocated Char: {}", heap.payload(char_ptr)?[0] as char);
  print_heap(&heap);

  let int_ptr = heap.allocate(size_of::<i32>())?;
  store(&mut heap, int_ptr, &1i32.to_ne_bytes())?;
  println!("Allocated Int: {}", i32::from_ne_bytes(heap.payload(int_ptr)?.try_into().unwrap_or_default()));
  print_heap(&heap);

  let float_ptr = heap.allocate(size_of::<f32>())?;
  store(&mut heap, float_ptr, &1.1f32.to_ne_bytes())?;
  println!("Allocated Float: {:.6}", f32::from_ne_bytes(heap.payload(float_ptr)?.try_into().unwrap_or_default()));
  print_heap(&heap);

  // --------------------------------------------------------------------
  // 2) Free the int, then the char. The two blocks merge.
  // --------------------------------------------------------------------
  release(&mut heap, int_ptr, "Int");
  release(&mut heap, char_ptr, "Char");

  // Already free: reported, nothing changes.
  release(&mut heap, int_ptr, "Int");

  // --------------------------------------------------------------------
  // 3) A two-char array lands in the merged block at the front.
  // --------------------------------------------------------------------
  let array_ptr = heap.allocate(2 * size_of::<u8>())?;
  store(&mut heap, array_ptr, b"BC")?;
  let array = heap.payload(array_ptr)?;
  println!(
    "Allocated array of characters of size 2: {}, {}",
    array[0] as char, array[1] as char
  );
  print_heap(&heap);

  // --------------------------------------------------------------------
  // 4) Free everything that is left.
  // --------------------------------------------------------------------
  release(&mut heap, float_ptr, "Float");
  release(&mut heap, array_ptr, "Char array of size 2");

  print_usage("end", &heap);

  if heap.is_pristine() {
    println!("Any memory allocated is successfully freed.");
  } else {
    println!("Please make sure to free the memory you allocated.");
  }

  Ok(())
}
